use std::fmt::{Display, Formatter};

/// Path segments that own their own rate limit buckets, the id that follows them stays literal
const MAJOR_PARAMETERS: [&str; 3] = ["channels", "guilds", "webhooks"];

const WILDCARD: &str = ":id";

/// Identifies a rate limit bucket. The api limits per major resource, not per exact path, so
/// minor ids (messages, users, roles, ...) are collapsed into a wildcard.
#[derive(Clone, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct BucketKey(String);

impl BucketKey {
    pub fn new(key: impl Into<String>) -> Self {
        BucketKey(key.into())
    }

    pub fn from_route(route: &str) -> Self {
        let path = route.split(['?', '#']).next().unwrap_or_default();
        let mut key = String::with_capacity(path.len());
        let mut previous: Option<&str> = None;

        for segment in path.split('/').filter(|segment| !segment.is_empty()) {
            key.push('/');
            let major = previous.map_or(false, |previous| MAJOR_PARAMETERS.contains(&previous));
            if is_snowflake(segment) && !major {
                key.push_str(WILDCARD);
            } else {
                key.push_str(segment);
            }
            previous = Some(segment);
        }

        if key.is_empty() {
            key.push('/');
        }

        BucketKey(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for BucketKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BucketKey {
    fn from(key: &str) -> Self {
        BucketKey::new(key)
    }
}

fn is_snowflake(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}
