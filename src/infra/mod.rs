pub mod git;
pub mod github;
pub mod llm;
pub mod remote;
