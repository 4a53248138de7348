pub mod audit;
pub mod config;
pub mod fetch;
pub mod locale;
pub mod page;
pub mod record;
pub mod report;
pub mod rules;
pub mod sitemap;
