pub mod match_service;
