mod common;
mod explanation;
mod service;
