// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # semantic-chat
//!
//! A chatbot that learns from the people it talks to and asks sensible
//! follow-up questions about things it recognizes from the schema.org
//! ontology.
//!
//! ## Architecture
//!
//! - **Ontology resolver** (`adapter::ontology`): `"X is a Y"` → `"What is {property} for X?"`
//!   using `domainIncludes` relations from an RDF schema graph (`schema`, oxigraph)
//! - **Baseline matcher** (`adapter::best_match`): edit-distance lookup over stored pairings
//! - **Dialogue loop** (`dialogue`): accept, confirm, or ask to be taught, gated by confidence
//! - **Feedback** (`feedback`): yes/no parsing and idempotent recording of validated pairings
//! - **Statement store** (`store`): in-memory (DashMap) or durable (redb)
//! - **Channels** (`channel`, `message`): terminal and scripted conversation surfaces
//!
//! ## Library usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use semantic_chat::channel::ScriptedChannel;
//! use semantic_chat::config::ChatConfig;
//! use semantic_chat::engine::ChatEngine;
//! use semantic_chat::schema::SchemaGraph;
//! use semantic_chat::store::MemStatementStore;
//!
//! let graph = SchemaGraph::load("http://schema.org/", &["schema.nt"]).unwrap();
//! let engine = ChatEngine::new(
//!     ChatConfig::default(),
//!     Arc::new(graph),
//!     Arc::new(MemStatementStore::new()),
//! );
//! let mut channel = ScriptedChannel::new(["yes"]);
//! engine.process("Avengers is a Movie", &mut channel).unwrap();
//! ```

pub mod adapter;
pub mod channel;
pub mod config;
pub mod corpus;
pub mod dialogue;
pub mod engine;
pub mod error;
pub mod feedback;
pub mod message;
pub mod paths;
pub mod preprocess;
pub mod schema;
pub mod store;
pub mod tagger;
pub mod utterance;
