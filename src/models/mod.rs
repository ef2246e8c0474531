// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod admin;
pub mod interest_group;
pub mod notification;
pub mod official;
pub mod ticket;
pub mod user;

pub use admin::{AdminStats, AdminUser, Applicant, Caregiver, InterestGroupAdmin, ReviewDecision};
pub use interest_group::{InterestGroup, InterestGroupInput};
pub use notification::{BackendNotification, Notification, NotificationId};
pub use official::Official;
pub use ticket::{
    AssignableUser, NewTicket, Ticket, TicketFilters, TicketPriority, TicketStatus, TicketUpdate,
    TicketView,
};
pub use user::{
    home_route_for, Permissions, ProfileUpdate, RegistrationPrefill, Role, Status, StatusGate,
    UserRecord,
};
