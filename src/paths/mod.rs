pub mod base;
#[cfg(feature = "dialogs")]
pub mod dialog;
pub mod fixed;
