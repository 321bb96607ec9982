pub mod cred_definition_config;
pub mod cred_offer;
pub mod cred_request;
pub mod credential;
pub mod link_secret;
pub mod nonce;
pub mod pres_request;
pub mod presentation;
pub mod rev_reg_config;
pub mod revocation_state;
