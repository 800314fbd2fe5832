//! Entity placement engine for a map-annotation palette.
//!
//! This crate is the headless core of a "marker palette": an operator picks a
//! categorized point marker from a catalog, places it on the host map by
//! click or drag-and-drop, then moves, restyles, annotates, or deletes it.
//! The host application owns the map engine, the DOM, and the layer
//! collection; it wires its raw events into [`engine::PaletteEngine`] and
//! applies the returned [`engine::Action`]s through its own layer-upsert and
//! selection calls. Nothing in here touches a browser API.
//!
//! All stored geometry lives in the canonical geographic CRS (EPSG:4326)
//! regardless of the host map's projection; conversion is best-effort and
//! never aborts a placement.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | The placement state machine and its [`engine::Action`] contract |
//! | [`session`] | Explicit Idle / Armed / MoveArmed session state |
//! | [`input`] | The three gesture sources and payload normalization |
//! | [`layer`] | Entity layer data model and copy-on-write projector |
//! | [`style`] | Selection halo and icon-transform synchronization |
//! | [`geo`] | CRS normalization, reprojection, pixel-inversion hook |
//! | [`catalog`] | Read-only palette item catalog |
//! | [`io`] | GeoJSON import/export of the entity collection |
//! | [`consts`] | Shared numeric and wire constants |

pub mod catalog;
pub mod consts;
pub mod engine;
pub mod geo;
pub mod input;
pub mod io;
pub mod layer;
pub mod session;
pub mod style;
