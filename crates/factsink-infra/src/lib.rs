//! Infrastructure layer for factsink.
//!
//! Implements the ports defined in `factsink-core` against AWS (S3, Bedrock
//! Runtime, AgentCore Memory) and local stand-ins (filesystem, SQLite), plus
//! the Lambda Runtime API client, SNS subscription confirmation and the
//! configuration loader.

pub mod agentcore;
pub mod aws;
pub mod backends;
pub mod config;
pub mod lambda;
pub mod llm;
pub mod local;
pub mod s3;
pub mod sns;
pub mod sqlite;
