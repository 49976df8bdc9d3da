use serde::{Deserialize, Serialize};

/// One piece of entry content. Plain text carries no prosody; annotated text
/// may carry pitch and rate hints for the speech synthesizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pitch: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate: Option<f32>,
}

impl Fragment {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            pitch: None,
            rate: None,
        }
    }

    pub fn with_pitch(mut self, pitch: f32) -> Self {
        self.pitch = Some(pitch);
        self
    }

    pub fn with_rate(mut self, rate: f32) -> Self {
        self.rate = Some(rate);
        self
    }

    pub fn is_annotated(&self) -> bool {
        self.pitch.is_some() || self.rate.is_some()
    }
}

/// Shorthand for a plain fragment.
pub fn text(text: impl Into<String>) -> Fragment {
    Fragment::new(text)
}

impl From<&str> for Fragment {
    fn from(text: &str) -> Self {
        Fragment::new(text)
    }
}

impl From<String> for Fragment {
    fn from(text: String) -> Self {
        Fragment::new(text)
    }
}

/// An ordered run of fragments, accepted wherever the script supplies
/// entry content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Content(pub Vec<Fragment>);

impl Content {
    pub fn into_fragments(self) -> Vec<Fragment> {
        self.0
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Content(vec![Fragment::new(text)])
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Content(vec![Fragment::new(text)])
    }
}

impl From<Fragment> for Content {
    fn from(fragment: Fragment) -> Self {
        Content(vec![fragment])
    }
}

impl<T: Into<Fragment>> From<Vec<T>> for Content {
    fn from(items: Vec<T>) -> Self {
        Content(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Fragment>, const N: usize> From<[T; N]> for Content {
    fn from(items: [T; N]) -> Self {
        Content(items.into_iter().map(Into::into).collect())
    }
}

/// Concatenate fragment text the way it is shown on the display surface.
pub fn join_text(fragments: &[Fragment]) -> String {
    fragments.iter().map(|f| f.text.as_str()).collect()
}
