use k8s_openapi::api::core::v1::PodSpec;

/// The config maps and secrets a pod spec references.
///
/// Names are collected in discovery order and may repeat when a pod reaches
/// the same object through more than one mechanism. Callers that need a set
/// should dedup; the cache's reverse indices do so on insert.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PodRefs {
    pub config_maps: Vec<String>,
    pub secrets: Vec<String>,
}

impl PodRefs {
    /// Collect every config map and secret referenced by `spec`: config-map
    /// and secret volumes, projected volume sources, container `envFrom`
    /// and per-key `env` references, and pod-level image-pull secrets.
    ///
    /// Pure and side-effect free. References whose name is absent are
    /// skipped rather than recorded as empty strings.
    pub fn from_spec(spec: &PodSpec) -> Self {
        let mut refs = Self::default();

        for volume in spec.volumes.iter().flatten() {
            if let Some(config_map) = &volume.config_map {
                refs.push_config_map(&config_map.name);
            }
            if let Some(secret) = &volume.secret {
                refs.push_secret(secret.secret_name.as_deref().unwrap_or_default());
            }
            if let Some(projected) = &volume.projected {
                for source in projected.sources.iter().flatten() {
                    if let Some(config_map) = &source.config_map {
                        refs.push_config_map(&config_map.name);
                    } else if let Some(secret) = &source.secret {
                        refs.push_secret(&secret.name);
                    }
                }
            }
        }

        for container in &spec.containers {
            for env_from in container.env_from.iter().flatten() {
                if let Some(config_map) = &env_from.config_map_ref {
                    refs.push_config_map(&config_map.name);
                }
                if let Some(secret) = &env_from.secret_ref {
                    refs.push_secret(&secret.name);
                }
            }
            for env in container.env.iter().flatten() {
                let Some(value_from) = &env.value_from else {
                    continue;
                };

                if let Some(config_map) = &value_from.config_map_key_ref {
                    refs.push_config_map(&config_map.name);
                } else if let Some(secret) = &value_from.secret_key_ref {
                    refs.push_secret(&secret.name);
                }
            }
        }

        for pull_secret in spec.image_pull_secrets.iter().flatten() {
            refs.push_secret(&pull_secret.name);
        }

        refs
    }

    pub fn is_empty(&self) -> bool {
        self.config_maps.is_empty() && self.secrets.is_empty()
    }

    fn push_config_map(&mut self, name: &str) {
        if !name.is_empty() {
            self.config_maps.push(name.to_string());
        }
    }

    fn push_secret(&mut self, name: &str) {
        if !name.is_empty() {
            self.secrets.push(name.to_string());
        }
    }
}

#[cfg(test)]
mod test {
    use k8s_openapi::api::core::v1::{
        ConfigMapKeySelector, ConfigMapVolumeSource, Container, EnvFromSource, EnvVar,
        EnvVarSource, LocalObjectReference, PodSpec, ProjectedVolumeSource, SecretEnvSource,
        SecretProjection, SecretVolumeSource, Volume, VolumeProjection,
    };

    use super::*;

    #[test]
    fn test_refs_from_every_source() {
        let spec = PodSpec {
            volumes: Some(vec![
                Volume {
                    name: "config".to_string(),
                    config_map: Some(ConfigMapVolumeSource {
                        name: "cfg1".to_string(),
                        ..Default::default()
                    }),
                    ..Default::default()
                },
                Volume {
                    name: "projected".to_string(),
                    projected: Some(ProjectedVolumeSource {
                        sources: Some(vec![VolumeProjection {
                            secret: Some(SecretProjection {
                                name: "sec1".to_string(),
                                ..Default::default()
                            }),
                            ..Default::default()
                        }]),
                        ..Default::default()
                    }),
                    ..Default::default()
                },
            ]),
            containers: vec![Container {
                name: "main".to_string(),
                env_from: Some(vec![EnvFromSource {
                    secret_ref: Some(SecretEnvSource {
                        name: "sec2".to_string(),
                        ..Default::default()
                    }),
                    ..Default::default()
                }]),
                env: Some(vec![EnvVar {
                    name: "SETTING".to_string(),
                    value_from: Some(EnvVarSource {
                        config_map_key_ref: Some(ConfigMapKeySelector {
                            key: "setting".to_string(),
                            name: "cfg2".to_string(),
                            ..Default::default()
                        }),
                        ..Default::default()
                    }),
                    ..Default::default()
                }]),
                ..Default::default()
            }],
            image_pull_secrets: Some(vec![LocalObjectReference {
                name: "sec3".to_string(),
            }]),
            ..Default::default()
        };

        let refs = PodRefs::from_spec(&spec);
        assert_eq!(refs.config_maps, vec!["cfg1", "cfg2"]);
        assert_eq!(refs.secrets, vec!["sec1", "sec2", "sec3"]);
    }

    #[test]
    fn test_refs_empty_spec() {
        assert!(PodRefs::from_spec(&PodSpec::default()).is_empty());
    }

    #[test]
    fn test_refs_keep_duplicates_in_discovery_order() {
        // one config map mounted as a volume and read through env
        let spec = PodSpec {
            volumes: Some(vec![Volume {
                name: "config".to_string(),
                config_map: Some(ConfigMapVolumeSource {
                    name: "cfg1".to_string(),
                    ..Default::default()
                }),
                ..Default::default()
            }]),
            containers: vec![Container {
                name: "main".to_string(),
                env: Some(vec![EnvVar {
                    name: "SETTING".to_string(),
                    value_from: Some(EnvVarSource {
                        config_map_key_ref: Some(ConfigMapKeySelector {
                            key: "setting".to_string(),
                            name: "cfg1".to_string(),
                            ..Default::default()
                        }),
                        ..Default::default()
                    }),
                    ..Default::default()
                }]),
                ..Default::default()
            }],
            ..Default::default()
        };

        let refs = PodRefs::from_spec(&spec);
        assert_eq!(refs.config_maps, vec!["cfg1", "cfg1"]);
        assert!(refs.secrets.is_empty());
    }

    #[test]
    fn test_refs_skip_nameless_references() {
        let spec = PodSpec {
            volumes: Some(vec![Volume {
                name: "config".to_string(),
                config_map: Some(ConfigMapVolumeSource::default()),
                secret: Some(SecretVolumeSource::default()),
                ..Default::default()
            }]),
            ..Default::default()
        };

        assert!(PodRefs::from_spec(&spec).is_empty());
    }
}
