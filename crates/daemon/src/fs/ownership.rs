use common::secret::Secret;

/// Owner and group given to secret files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Ownership {
    pub uid: u32,
    pub gid: u32,
}

impl Ownership {
    pub fn new(uid: u32, gid: u32) -> Self {
        Self { uid, gid }
    }

    /// Ownership for a secret: its numeric owner/group if it names one,
    /// these defaults otherwise
    pub fn resolve(&self, secret: &Secret) -> Ownership {
        Ownership {
            uid: parse_id(secret.owner.as_deref()).unwrap_or(self.uid),
            gid: parse_id(secret.group.as_deref()).unwrap_or(self.gid),
        }
    }
}

fn parse_id(id: Option<&str>) -> Option<u32> {
    let id = id?.trim();
    match id.parse() {
        Ok(id) => Some(id),
        Err(_) => {
            if !id.is_empty() {
                tracing::debug!("ignoring non-numeric owner '{}'", id);
            }
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve() {
        let defaults = Ownership::new(1000, 1000);

        let secret = Secret {
            owner: Some("33".to_string()),
            group: Some("www-data".to_string()),
            ..Default::default()
        };
        assert_eq!(defaults.resolve(&secret), Ownership::new(33, 1000));
        assert_eq!(defaults.resolve(&Secret::default()), defaults);
    }
}
