//! Image roles and the image-parameter map.

use std::fmt;

/// Role of an image variable within one compiled script.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ImageRole {
    /// Read-only input.
    Source,
    /// Write-only output.
    Dest,
}

impl fmt::Display for ImageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageRole::Source => write!(f, "source"),
            ImageRole::Dest => write!(f, "destination"),
        }
    }
}

/// Error returned when an image name is registered twice.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageParamsError {
    pub name: String,
    pub existing: ImageRole,
}

impl fmt::Display for ImageParamsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "image variable `{}` is already declared as a {} image",
            self.name, self.existing
        )
    }
}

impl std::error::Error for ImageParamsError {}

/// Ordered map from image variable name to role.
///
/// Insertion order is preserved so that "the first source image" is a
/// well-defined notion when the runtime picks a default world.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImageParams {
    entries: Vec<(String, ImageRole)>,
}

impl ImageParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an image variable. A name may hold exactly one role.
    pub fn insert(&mut self, name: impl Into<String>, role: ImageRole) -> Result<(), ImageParamsError> {
        let name = name.into();
        if let Some(existing) = self.role(&name) {
            return Err(ImageParamsError { name, existing });
        }
        self.entries.push((name, role));
        Ok(())
    }

    /// Builder form of [`insert`](Self::insert) for literals in tests and callers.
    pub fn with(mut self, name: impl Into<String>, role: ImageRole) -> Result<Self, ImageParamsError> {
        self.insert(name, role)?;
        Ok(self)
    }

    pub fn role(&self, name: &str) -> Option<ImageRole> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, role)| *role)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ImageRole)> {
        self.entries.iter().map(|(n, r)| (n.as_str(), *r))
    }

    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.iter()
            .filter(|(_, r)| *r == ImageRole::Source)
            .map(|(n, _)| n)
    }

    pub fn dests(&self) -> impl Iterator<Item = &str> {
        self.iter()
            .filter(|(_, r)| *r == ImageRole::Dest)
            .map(|(n, _)| n)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests {
    use super::*;

    #[test]
    fn test_role_is_exclusive() {
        let mut params = ImageParams::new();
        params.insert("src", ImageRole::Source).unwrap();
        let err = params.insert("src", ImageRole::Dest).unwrap_err();
        assert_eq!(err.existing, ImageRole::Source);
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_order_is_preserved() {
        let params = ImageParams::new()
            .with("b", ImageRole::Source)
            .and_then(|p| p.with("out", ImageRole::Dest))
            .and_then(|p| p.with("a", ImageRole::Source))
            .unwrap();
        let sources: Vec<_> = params.sources().collect();
        assert_eq!(sources, vec!["b", "a"]);
        assert_eq!(params.dests().collect::<Vec<_>>(), vec!["out"]);
    }
}
