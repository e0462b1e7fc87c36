//! Resource ARN composition
//!
//! The ARN is only needed for tag synchronization. It combines the
//! configured region, the account id taken from the caller's own ARN, and
//! the option group name.

use crate::context::{AccountLookup, IdentityResolver};
use crate::error::LookupError;

/// Partition used for every composed ARN
pub const PARTITION: &str = "aws";

/// Compose an option group ARN
pub fn option_group_arn(region: &str, account_id: &str, group_name: &str) -> String {
    format!("arn:{PARTITION}:rds:{region}:{account_id}:og:{group_name}")
}

/// Extract the account id (fifth field) from an ARN
pub fn account_from_arn(arn: &str) -> Result<&str, LookupError> {
    match arn.split(':').nth(4) {
        Some(account) if !account.is_empty() => Ok(account),
        _ => Err(LookupError::MalformedArn(arn.to_string())),
    }
}

/// Account lookup backed by a fixed account id
#[derive(Debug, Clone)]
pub struct StaticAccount(pub String);

impl AccountLookup for StaticAccount {
    fn caller_arn(&self) -> Result<String, LookupError> {
        Ok(format!("arn:{PARTITION}:iam::{}:root", self.0))
    }
}

/// Resolves option group ARNs from a region and a caller identity lookup
#[derive(Debug)]
pub struct ArnResolver<L> {
    region: String,
    lookup: L,
}

impl<L: AccountLookup> ArnResolver<L> {
    pub fn new(region: impl Into<String>, lookup: L) -> Self {
        Self {
            region: region.into(),
            lookup,
        }
    }
}

impl<L: AccountLookup> IdentityResolver for ArnResolver<L> {
    fn resource_arn(&self, resource_id: &str) -> Result<String, LookupError> {
        if self.region.is_empty() {
            return Err(LookupError::MissingRegion);
        }
        let caller = self.lookup.caller_arn()?;
        let account = account_from_arn(&caller)?;
        Ok(option_group_arn(&self.region, account, resource_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingLookup;

    impl AccountLookup for FailingLookup {
        fn caller_arn(&self) -> Result<String, LookupError> {
            Err(LookupError::Unavailable("no credentials".into()))
        }
    }

    struct UserLookup(&'static str);

    impl AccountLookup for UserLookup {
        fn caller_arn(&self) -> Result<String, LookupError> {
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn test_account_from_user_arn() {
        let account = account_from_arn("arn:aws:iam::123456789012:user/deploy").unwrap();
        assert_eq!(account, "123456789012");
    }

    #[test]
    fn test_account_from_short_arn() {
        assert!(account_from_arn("arn:aws:iam").is_err());
        assert!(account_from_arn("arn:aws:iam:::user/x").is_err());
    }

    #[test]
    fn test_resolves_from_user() {
        let resolver = ArnResolver::new(
            "us-west-2",
            UserLookup("arn:aws:iam::123456789012:user/deploy"),
        );
        assert_eq!(
            resolver.resource_arn("my-og").unwrap(),
            "arn:aws:rds:us-west-2:123456789012:og:my-og"
        );
    }

    #[test]
    fn test_resolves_from_static_account() {
        let resolver = ArnResolver::new("eu-west-1", StaticAccount("210987654321".into()));
        assert_eq!(
            resolver.resource_arn("og").unwrap(),
            "arn:aws:rds:eu-west-1:210987654321:og:og"
        );
    }

    #[test]
    fn test_lookup_failure_propagates() {
        let resolver = ArnResolver::new("us-east-1", FailingLookup);
        assert!(matches!(
            resolver.resource_arn("og"),
            Err(LookupError::Unavailable(_))
        ));
    }

    #[test]
    fn test_missing_region() {
        let resolver = ArnResolver::new("", StaticAccount("1".into()));
        assert!(matches!(
            resolver.resource_arn("og"),
            Err(LookupError::MissingRegion)
        ));
    }
}
