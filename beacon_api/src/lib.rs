//! A minimal client for the [Eth Beacon Node API].
//!
//! Only the endpoints needed to sample fork choice state are implemented:
//! genesis metadata, the head header, the fork choice dump, and committee
//! listings for sizing the validator set.
//!
//! [Eth Beacon Node API]: https://ethereum.github.io/beacon-APIs/

pub use crate::{
    client::BeaconApiClient,
    containers::{ForkChoiceContext, HeadHeader},
    error::Error,
};

mod client;
mod containers;
mod error;
