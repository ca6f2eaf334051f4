//! Domain services used by the session driver and HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! `gateway` owns every model call. `badges` and `expand` hold the prompt
//! text and the lenient reply parsers it relies on, so they stay testable
//! without a client.

pub mod badges;
pub mod expand;
pub mod gateway;
