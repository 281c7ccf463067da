#![allow(dead_code)]

pub mod manifests {
    use brrtbind::runtime_config::RuntimeConfig;
    use brrtbind::service::BindingService;
    use brrtbind::spec::{load_manifest, load_manifest_from_str, DocumentFormat};
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    /// The sample manifest shipped with the crate.
    pub fn products_path() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("manifests/products.yaml")
    }

    /// Service over the sample manifest with default runtime config.
    pub fn products_service() -> BindingService {
        service_with_config(load_manifest(products_path()).unwrap(), RuntimeConfig::default())
    }

    pub fn service_from_yaml(yaml: &str) -> BindingService {
        let manifest = load_manifest_from_str(yaml, DocumentFormat::Yaml).unwrap();
        service_with_config(manifest, RuntimeConfig::default())
    }

    pub fn service_with_config(
        manifest: brrtbind::Manifest,
        config: RuntimeConfig,
    ) -> BindingService {
        BindingService::builder(manifest).config(config).build().unwrap()
    }

    /// Write `content` to a temp file with the given extension; the file lives as
    /// long as the returned handle.
    pub fn temp_manifest(content: &str, ext: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new()
            .prefix("brrtb_manifest_")
            .suffix(&format!(".{ext}"))
            .tempfile()
            .unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }
}

pub mod requests {
    use brrtbind::bound::BoundArguments;
    use brrtbind::error::BindingError;
    use brrtbind::request::BindRequest;
    use brrtbind::service::BindingService;

    /// Bind `request` against `operation_id` of `service`.
    pub fn bind(
        service: &BindingService,
        operation_id: &str,
        mut request: BindRequest,
    ) -> Result<BoundArguments, BindingError> {
        let op = service.operation(operation_id).unwrap().clone();
        service.bind(&op, &mut request)
    }
}
