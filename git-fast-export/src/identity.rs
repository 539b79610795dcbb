use std::fmt::Display;

/// A committer identity with a raw timestamp and UTC offset, rendered as
/// `name <email> <unix-seconds> <±HHMM>`.
#[derive(Debug, Clone)]
pub struct Identity {
    name: String,
    email: String,
    when: i64,
    offset: i32,
}

impl Identity {
    /// Constructs a new identity. `offset` is in seconds east of UTC;
    /// sub-minute components are truncated when rendering.
    pub fn new<N, E>(name: N, email: E, when: i64, offset: i32) -> Self
    where
        N: Into<String>,
        E: Into<String>,
    {
        Self {
            name: name.into(),
            email: email.into(),
            when,
            offset,
        }
    }
}

impl Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.offset < 0 { '-' } else { '+' };
        let abs = self.offset.abs();

        write!(
            f,
            "{} <{}> {} {}{:02}{:02}",
            self.name,
            self.email,
            self.when,
            sign,
            abs / 3600,
            (abs % 3600) / 60
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            Identity::new("J. Random", "jr@example.com", 1000000000, 0).to_string(),
            "J. Random <jr@example.com> 1000000000 +0000"
        );
        assert_eq!(
            Identity::new("a", "a", 12, -16200).to_string(),
            "a <a> 12 -0430"
        );
        assert_eq!(
            Identity::new("a", "a", 12, 3600).to_string(),
            "a <a> 12 +0100"
        );
    }
}
