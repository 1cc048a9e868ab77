pub mod random_org;
