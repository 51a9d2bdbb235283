pub mod origin_ca_certificate;
pub mod record;

use crate::resource::{Resource, ResourceError};

pub use origin_ca_certificate::OriginCaCertificateResource;
pub use record::RecordResource;

pub fn get_resource(name: &str) -> Result<Box<dyn Resource>, ResourceError> {
    match name {
        record::RESOURCE_TYPE => Ok(Box::new(RecordResource)),
        origin_ca_certificate::RESOURCE_TYPE => Ok(Box::new(OriginCaCertificateResource)),
        other => Err(ResourceError::UnknownResource(other.to_string())),
    }
}

pub fn resource_types() -> Vec<&'static str> {
    vec![record::RESOURCE_TYPE, origin_ca_certificate::RESOURCE_TYPE]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_resource_record() {
        let resource = get_resource("cloudflare_record").unwrap();
        assert_eq!(resource.type_name(), "cloudflare_record");
        assert_eq!(resource.schema().version, 1);
    }

    #[test]
    fn test_get_resource_origin_ca_certificate() {
        let resource = get_resource("cloudflare_origin_ca_certificate").unwrap();
        assert_eq!(resource.type_name(), "cloudflare_origin_ca_certificate");
    }

    #[test]
    fn test_get_resource_unknown() {
        let result = get_resource("cloudflare_page_rule");
        match result {
            Err(ResourceError::UnknownResource(name)) => assert_eq!(name, "cloudflare_page_rule"),
            _ => panic!("expected UnknownResource error"),
        }
    }

    #[test]
    fn test_resource_types_resolve() {
        for name in resource_types() {
            assert_eq!(get_resource(name).unwrap().type_name(), name);
        }
    }

    #[test]
    fn test_certificate_import_is_passthrough() {
        let resource = get_resource("cloudflare_origin_ca_certificate").unwrap();
        let data = resource.import_state("328578533902268680212849205732770752308931942346").unwrap();
        assert_eq!(data.id(), "328578533902268680212849205732770752308931942346");
        assert!(data.attributes.is_empty());
    }
}
