//! JSON configuration of the site and of the command-line tools.

pub mod calibrate;
pub mod report;
pub mod site;
