use crate::ordered::OrderedMap;
use crate::SchemaError;
use serde::{Deserialize, Serialize};

/// Bill of materials for a platform release or a Kubernetes release.
///
/// Both flavors share this shape; they differ only in which version axis
/// they are published under. Fields the bundler does not consume are
/// ignored on parse.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Bom {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release: Option<ReleaseInfo>,
    pub components: OrderedMap<Vec<ComponentInfo>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_config: Option<ImageConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ReleaseInfo {
    pub version: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ImageConfig {
    pub image_repository: String,
}

/// One version of a component and the images it ships.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct ComponentInfo {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub images: OrderedMap<ImageInfo>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ImageInfo {
    /// Repository path relative to the source registry root.
    pub image_path: String,
    pub tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_repository: Option<String>,
}

impl Bom {
    /// Parse and validate a BOM document.
    pub fn from_yaml(bytes: &[u8]) -> Result<Self, SchemaError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| SchemaError::malformed(format!("BOM is not valid UTF-8: {e}")))?;
        let bom: Bom = serde_yaml::from_str(text).map_err(SchemaError::malformed)?;
        bom.validate()?;
        Ok(bom)
    }

    fn validate(&self) -> Result<(), SchemaError> {
        for (name, infos) in self.components.iter() {
            for info in infos {
                for (image_name, image) in info.images.iter() {
                    if image.image_path.trim_matches('/').is_empty() {
                        return Err(SchemaError::malformed(format!(
                            "component '{name}' image '{image_name}': empty imagePath"
                        )));
                    }
                    if image.tag.is_empty() {
                        return Err(SchemaError::malformed(format!(
                            "component '{name}' image '{image_name}': empty tag"
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    pub fn components(&self) -> &OrderedMap<Vec<ComponentInfo>> {
        &self.components
    }

    /// Every image of every component, flattened in document order.
    pub fn images(&self) -> impl Iterator<Item = &ImageInfo> {
        self.components
            .values()
            .flat_map(|infos| infos.iter())
            .flat_map(|info| info.images.values())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLATFORM_BOM: &str = r"
apiVersion: run.tanzu.vmware.com/v1alpha2
release:
  version: v1.5.0
components:
  etcd:
    - version: v3.5.0+vmware.1
      images:
        etcd:
          imagePath: etcd
          tag: v3.5.0_vmware.1
  kube_rbac_proxy:
    - version: v0.8.0+vmware.1
      images:
        kubeRbacProxyControllerImageCapi:
          imagePath: cluster-api/kube-rbac-proxy
          tag: v0.8.0_vmware.1
        kubeRbacProxyOther:
          imagePath: cluster-api/kube-rbac-proxy-other
          tag: v0.8.0_vmware.1
  tanzu-framework-addons:
    - version: v0.10.0
      images:
        tanzuAddonsManagerImage:
          imagePath: packages/core/addons-manager
          tag: v1.5.0_vmware.1
          imageRepository: projects.example.com/tkg
imageConfig:
  imageRepository: projects.example.com/tkg
extraField:
  ignored: true
";

    #[test]
    fn parses_platform_bom() {
        let bom = Bom::from_yaml(PLATFORM_BOM.as_bytes()).unwrap();
        assert_eq!(bom.release.as_ref().unwrap().version, "v1.5.0");
        assert_eq!(bom.components().len(), 3);
        assert_eq!(
            bom.image_config.as_ref().unwrap().image_repository,
            "projects.example.com/tkg"
        );
    }

    #[test]
    fn images_are_flattened_in_document_order() {
        let bom = Bom::from_yaml(PLATFORM_BOM.as_bytes()).unwrap();
        let paths: Vec<&str> = bom.images().map(|i| i.image_path.as_str()).collect();
        assert_eq!(
            paths,
            [
                "etcd",
                "cluster-api/kube-rbac-proxy",
                "cluster-api/kube-rbac-proxy-other",
                "packages/core/addons-manager",
            ]
        );
    }

    #[test]
    fn component_order_is_document_order() {
        let bom = Bom::from_yaml(PLATFORM_BOM.as_bytes()).unwrap();
        let names: Vec<&str> = bom.components().keys().collect();
        assert_eq!(names, ["etcd", "kube_rbac_proxy", "tanzu-framework-addons"]);
    }

    #[test]
    fn component_without_images_is_allowed() {
        let input = "components:\n  empty:\n    - version: v1\n";
        let bom = Bom::from_yaml(input.as_bytes()).unwrap();
        assert_eq!(bom.images().count(), 0);
    }

    #[test]
    fn rejects_missing_components() {
        let err = Bom::from_yaml(b"release:\n  version: v1.5.0\n").unwrap_err();
        assert!(matches!(err, SchemaError::MalformedDocument(_)));
    }

    #[test]
    fn rejects_missing_tag() {
        let input = "components:\n  etcd:\n    - images:\n        etcd:\n          imagePath: etcd\n";
        let err = Bom::from_yaml(input.as_bytes()).unwrap_err();
        assert!(matches!(err, SchemaError::MalformedDocument(_)));
    }

    #[test]
    fn rejects_empty_image_path() {
        let input =
            "components:\n  etcd:\n    - images:\n        etcd:\n          imagePath: \"\"\n          tag: v1\n";
        let err = Bom::from_yaml(input.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("empty imagePath"));
    }

    #[test]
    fn rejects_wrong_component_type() {
        let input = "components:\n  etcd: just-a-string\n";
        assert!(Bom::from_yaml(input.as_bytes()).is_err());
    }

    #[test]
    fn rejects_invalid_utf8() {
        let err = Bom::from_yaml(&[0xff, 0xfe, 0x00]).unwrap_err();
        assert!(err.to_string().contains("UTF-8"));
    }
}
