#![allow(dead_code)]

use csrkit::config::IssuanceConfig;
use csrkit::issue::{IssuedRequest, issue};

pub fn server_config() -> IssuanceConfig {
    IssuanceConfig::from_yaml_str(
        r#"
cn: server.myca.local
dn:
  country: DE
  state: Hamburg
  city: Hamburg
  org: My CA
ku:
  - digitalSignature
  - keyEncipherment
eku:
  - serverAuth
  - clientAuth
"#,
    )
    .unwrap()
}

pub fn issue_server_request() -> IssuedRequest {
    issue(server_config()).unwrap()
}

pub fn issue_default_request() -> IssuedRequest {
    issue(IssuanceConfig::default()).unwrap()
}
