use regex::Regex;
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

static QUALIFIED_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^/]+)/([^/]+)$").expect("invalid volume name pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("volume name must be of the form <repository>/<volume>")]
pub struct InvalidVolumeName;

/// Docker-facing volume name, `<repository>/<volume>`.
///
/// This is the only place that knows how the backend's compound key
/// `(repository, volume)` maps onto a single Docker volume name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedName {
    repository: String,
    volume: String,
}

impl QualifiedName {
    pub fn new<R: Into<String>, V: Into<String>>(repository: R, volume: V) -> Self {
        Self {
            repository: repository.into(),
            volume: volume.into(),
        }
    }

    pub fn parse(name: &str) -> Result<Self, InvalidVolumeName> {
        let caps = QUALIFIED_NAME.captures(name).ok_or(InvalidVolumeName)?;
        Ok(Self::new(&caps[1], &caps[2]))
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    pub fn volume(&self) -> &str {
        &self.volume
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.repository, self.volume)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_repository_and_volume() {
        let name = QualifiedName::parse("foo/vol").unwrap();
        assert_eq!(name.repository(), "foo");
        assert_eq!(name.volume(), "vol");
        assert_eq!(name.to_string(), "foo/vol");
    }

    #[test]
    fn rejects_malformed_names() {
        for bad in ["", "foo", "/vol", "foo/", "/", "foo/bar/baz", "foo//bar", "a/b/"] {
            assert_eq!(
                QualifiedName::parse(bad),
                Err(InvalidVolumeName),
                "accepted {:?}",
                bad
            );
        }
    }

    #[test]
    fn error_message_is_fixed() {
        assert_eq!(
            InvalidVolumeName.to_string(),
            "volume name must be of the form <repository>/<volume>"
        );
    }
}
