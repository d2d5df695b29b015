pub mod mock;

pub use mock::{EchoResponder, FailingAnalyzer, FailingResponder, ScriptedAnalyzer};
