//! Cubeviz - a graph state engine for cube dependency visualization.
//!
//! Renders a dependency graph of hierarchical business-rule entities
//! ("cubes") as an interactive node/edge diagram. The engine partitions a
//! full node/edge set into visible and excluded subsets given a selected
//! depth and group selection, collapses and re-expands descendant subtrees
//! on demand, and keeps the scope used to resolve the graph persisted per
//! application and cube.
//!
//! The host application shell, the transport behind [`fetch::GraphFetcher`],
//! and the visual engine behind [`render::GraphRenderer`] are external
//! collaborators; everything stateful in between lives in
//! [`controller::ViewController`], one instance per view.

#![forbid(unsafe_code)]

pub mod cluster;
pub mod controller;
pub mod domain;
pub mod error;
pub mod fetch;
pub mod render;
pub mod scope;
pub mod visibility;
