//! Extraction pipeline: fast synchronous front door plus the background
//! worker it hands off to via the dispatcher.

pub mod dispatcher;
pub mod extraction;
