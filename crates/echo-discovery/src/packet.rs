use echo_types::Role;

/// One discovery datagram: `username|W|tcp_port` or `username|R|tcp_port`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Announcement {
    pub username: String,
    pub role: Role,
    pub tcp_port: u16,
}

impl Announcement {
    /// Render the pipe-delimited wire form.
    pub fn to_wire(&self) -> String {
        format!("{}|{}|{}", self.username, self.role.wire_tag(), self.tcp_port)
    }

    /// Parse a datagram. Malformed packets yield `None` and are dropped.
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.splitn(3, '|');
        let username = parts.next()?;
        let role = Role::from_wire_tag(parts.next()?).ok()?;
        let tcp_port = parts.next()?.parse().ok()?;
        if username.is_empty() {
            return None;
        }
        Some(Self {
            username: username.to_string(),
            role,
            tcp_port,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_roundtrip() {
        let ann = Announcement {
            username: "alice".into(),
            role: Role::Reader,
            tcp_port: 41234,
        };
        assert_eq!(ann.to_wire(), "alice|R|41234");
        assert_eq!(Announcement::parse(&ann.to_wire()), Some(ann));
    }

    #[test]
    fn writer_tag() {
        let ann = Announcement {
            username: "bob".into(),
            role: Role::Writer,
            tcp_port: 40001,
        };
        assert_eq!(ann.to_wire(), "bob|W|40001");
    }

    #[test]
    fn malformed_packets_are_dropped() {
        assert_eq!(Announcement::parse(""), None);
        assert_eq!(Announcement::parse("alice"), None);
        assert_eq!(Announcement::parse("alice|R"), None);
        assert_eq!(Announcement::parse("alice|X|4000"), None);
        assert_eq!(Announcement::parse("alice|R|notaport"), None);
        assert_eq!(Announcement::parse("|R|4000"), None);
    }

    #[test]
    fn port_zero_is_accepted() {
        // A reader that has not bound its server yet advertises port 0;
        // the dialer skips it.
        let ann = Announcement::parse("carol|R|0").unwrap();
        assert_eq!(ann.tcp_port, 0);
    }
}
