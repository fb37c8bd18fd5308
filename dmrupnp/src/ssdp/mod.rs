//! # Module SSDP - Simple Service Discovery Protocol
//!
//! Côté control point uniquement : envoi d'un M-SEARCH en multicast puis
//! collecte des réponses HTTP/200 reçues en unicast pendant une fenêtre bornée.
//!
//! ## Constants SSDP
//!
//! - **Multicast Address**: 239.255.255.250:1900
//! - **Search target**: `ssdp:all` par défaut

mod client;

pub use client::{SearchResponse, SsdpClient, parse_search_response};

use std::net::Ipv4Addr;

/// Adresse multicast SSDP
pub const SSDP_MULTICAST_ADDR: Ipv4Addr = Ipv4Addr::new(239, 255, 255, 250);

/// Port SSDP
pub const SSDP_PORT: u16 = 1900;

/// Search target matching every device and service
pub const SSDP_ALL: &str = "ssdp:all";
