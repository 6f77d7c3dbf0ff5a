mod common;
mod moderation;
mod validation;
