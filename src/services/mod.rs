// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - backend and identity provider access.

pub mod admin;
pub mod api;
pub mod identity;
pub mod interest_groups;
pub mod notifications;
pub mod officials;
pub mod test_identity;
pub mod tickets;
pub mod users;

pub use admin::AdminService;
pub use api::{ApiClient, ApiError, ApiResponse, RequestOptions, SessionTokens, TokenSource};
pub use identity::{
    CredentialPrompt, FirebaseEndpoints, FirebaseIdentity, IdentityError, IdentityProvider,
    IdentityUser, SignInResult, StaticCredentialPrompt,
};
pub use interest_groups::InterestGroupsService;
pub use notifications::NotificationsService;
pub use officials::OfficialsService;
pub use test_identity::TestIdentity;
pub use tickets::TicketsService;
pub use users::{Registration, UsersService};
