/// Legacy DID of the issuer every fixture signs with.
pub const ISSUER_DID: &str = "NcYxiDXkpYi6ov5FcYDi1e";
pub const PROVER_DID: &str = "VsKV7grR1BUE29mG2Fm2kX";

pub const SCHEMA_NAME: &str = "gvt";
pub const SCHEMA_VERSION: &str = "1.0";
pub const SCHEMA_ATTRS: [&str; 4] = ["name", "sex", "age", "height"];

pub const CRED_DEF_TAG: &str = "tag1";
pub const REV_REG_TAG: &str = "rev_tag1";
pub const LINK_SECRET_NAME: &str = "main";

pub const NAME: &str = "Alex";
pub const SEX: &str = "male";
pub const AGE: &str = "28";
pub const HEIGHT: &str = "175";
