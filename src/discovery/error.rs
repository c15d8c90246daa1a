#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("Docker 데몬 연결 실패: {context} ({source})")]
    ConnectionError {
        #[source]
        source: bollard::errors::Error,
        context: String,
    },

    #[error("컨테이너 목록 조회 실패: {context} ({source})")]
    ListContainersError {
        #[source]
        source: bollard::errors::Error,
        context: String,
    },

    #[error("컨테이너 {container_id} 네트워크 {network}에서 주소를 찾을 수 없음: {reason}")]
    NetworkError {
        container_id: String,
        network: String,
        reason: String,
    },

    #[error("컨테이너 {container_id} 라벨 오류: {reason}")]
    LabelError {
        container_id: String,
        reason: String,
    },

    #[error("이벤트 스트림 오류: {0}")]
    EventStreamError(String),
}

impl DiscoveryError {
    /// 일시적 오류 여부. 연결/조회 실패는 재시도할 가치가 있습니다.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DiscoveryError::ConnectionError { .. }
                | DiscoveryError::ListContainersError { .. }
                | DiscoveryError::EventStreamError(_)
        )
    }
}
