pub mod browser;
pub mod collector;
pub mod provisioner;
pub mod validation;
