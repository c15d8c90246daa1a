use crate::router::error::RouterError;

/// 요청에서 추출한 호스트 정보를 담는 불변 데이터 구조입니다.
#[derive(Clone, Debug, PartialEq)]
pub struct HostInfo {
    pub name: String,
    pub port: Option<u16>,
}

impl HostInfo {
    /// Host 헤더 값에서 HostInfo를 생성합니다.
    ///
    /// `example.com` 또는 `example.com:8080` 형식을 받아들입니다.
    pub fn from_header_value(value: &str) -> Result<Self, RouterError> {
        if value.is_empty() {
            return Err(RouterError::InvalidHost {
                host: value.to_string(),
                reason: "호스트가 비어있음".to_string(),
            });
        }

        let parts: Vec<&str> = value.split(':').collect();
        match parts.len() {
            1 => Ok(HostInfo {
                name: value.to_string(),
                port: None,
            }),
            2 => {
                if parts[0].is_empty() {
                    return Err(RouterError::InvalidHost {
                        host: value.to_string(),
                        reason: "호스트 이름이 비어있음".to_string(),
                    });
                }

                let port = parts[1].parse::<u16>().map_err(|_| {
                    RouterError::InvalidPort {
                        port: parts[1].to_string(),
                        reason: "숫자가 아님".to_string(),
                    }
                })?;

                if port == 0 {
                    return Err(RouterError::InvalidPort {
                        port: parts[1].to_string(),
                        reason: "포트는 0보다 커야 함".to_string(),
                    });
                }

                Ok(HostInfo {
                    name: parts[0].to_string(),
                    port: Some(port),
                })
            }
            _ => Err(RouterError::InvalidHost {
                host: value.to_string(),
                reason: "형식 오류".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_without_port() {
        let info = HostInfo::from_header_value("example.com").unwrap();
        assert_eq!(info.name, "example.com");
        assert_eq!(info.port, None);
    }

    #[test]
    fn test_host_with_port() {
        let info = HostInfo::from_header_value("example.com:8443").unwrap();
        assert_eq!(info.name, "example.com");
        assert_eq!(info.port, Some(8443));
    }

    #[test]
    fn test_invalid_hosts() {
        assert!(HostInfo::from_header_value("").is_err());
        assert!(HostInfo::from_header_value(":8080").is_err());
        assert!(HostInfo::from_header_value("example.com:abc").is_err());
        assert!(HostInfo::from_header_value("example.com:0").is_err());
        assert!(HostInfo::from_header_value("a:b:c").is_err());
    }
}
