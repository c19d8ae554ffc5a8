// Matching on device names

use super::{DeviceMatcher, MatchContext};
use crate::devset::DeviceSet;
use glob::Pattern;

pub struct ExactName;

impl DeviceMatcher for ExactName {
    fn name(&self) -> &'static str {
        "exact-name"
    }

    fn find(&self, token: &str, ctx: &MatchContext<'_>) -> Option<DeviceSet> {
        ctx.netinfo
            .interfaces()
            .contains(token)
            .then(|| [token].into_iter().collect())
    }
}

/// Shell-style glob (`*`, `?`, `[...]`) over every known device name.
pub struct NameGlob;

impl DeviceMatcher for NameGlob {
    fn name(&self) -> &'static str {
        "name-glob"
    }

    fn find(&self, token: &str, ctx: &MatchContext<'_>) -> Option<DeviceSet> {
        let pattern = Pattern::new(token).ok()?;
        let found: DeviceSet = ctx
            .netinfo
            .interfaces()
            .iter()
            .filter(|dev| pattern.matches(dev))
            .collect();
        (!found.is_empty()).then_some(found)
    }
}
