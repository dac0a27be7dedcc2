//! Tokens accepted in an `iframe` `sandbox` attribute.

use std::fmt;

/// A single `sandbox` token an `iframe` may keep.
///
/// Passed to [`Policy::require_sandbox_on_iframe`](crate::Policy::require_sandbox_on_iframe).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SandboxValue {
    AllowDownloads,
    AllowDownloadsWithoutUserActivation,
    AllowForms,
    AllowModals,
    AllowOrientationLock,
    AllowPointerLock,
    AllowPopups,
    AllowPopupsToEscapeSandbox,
    AllowPresentation,
    AllowSameOrigin,
    AllowScripts,
    AllowStorageAccessByUserActivation,
    AllowTopNavigation,
    AllowTopNavigationByUserActivation,
}

impl SandboxValue {
    /// The token as written in markup.
    pub fn as_str(self) -> &'static str {
        match self {
            SandboxValue::AllowDownloads => "allow-downloads",
            SandboxValue::AllowDownloadsWithoutUserActivation => {
                "allow-downloads-without-user-activation"
            }
            SandboxValue::AllowForms => "allow-forms",
            SandboxValue::AllowModals => "allow-modals",
            SandboxValue::AllowOrientationLock => "allow-orientation-lock",
            SandboxValue::AllowPointerLock => "allow-pointer-lock",
            SandboxValue::AllowPopups => "allow-popups",
            SandboxValue::AllowPopupsToEscapeSandbox => "allow-popups-to-escape-sandbox",
            SandboxValue::AllowPresentation => "allow-presentation",
            SandboxValue::AllowSameOrigin => "allow-same-origin",
            SandboxValue::AllowScripts => "allow-scripts",
            SandboxValue::AllowStorageAccessByUserActivation => {
                "allow-storage-access-by-user-activation"
            }
            SandboxValue::AllowTopNavigation => "allow-top-navigation",
            SandboxValue::AllowTopNavigationByUserActivation => {
                "allow-top-navigation-by-user-activation"
            }
        }
    }
}

impl fmt::Display for SandboxValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
