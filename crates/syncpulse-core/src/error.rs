//! SyncPulse 핵심 에러 타입.
//!
//! 모든 어댑터 crate는 이 에러를 그대로 반환하거나 자체 에러 타입에서
//! `From<CoreError>`로 변환한다.

use thiserror::Error;

/// 채널별 전달 실패 정보
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelFailure {
    /// 채널 이름 (예: "email", "chat")
    pub channel: String,
    /// 마지막 시도의 실패 사유
    pub message: String,
}

/// 코어 레이어 에러.
#[derive(Debug, Error)]
pub enum CoreError {
    /// JSON 직렬화/역직렬화 실패
    #[error("직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 설정값 오류
    #[error("설정 에러: {0}")]
    Config(String),

    /// 필드 유효성 검증 실패
    #[error("유효성 검증 실패 ({field}): {message}")]
    Validation {
        /// 검증 실패한 필드명
        field: String,
        /// 실패 사유
        message: String,
    },

    /// 리소스를 찾을 수 없음
    #[error("{resource_type} 미발견: {id}")]
    NotFound {
        /// 리소스 종류 (예: "Alert")
        resource_type: String,
        /// 리소스 식별자
        id: String,
    },

    /// 내부 에러 (예상치 못한 상황)
    #[error("내부 에러: {0}")]
    Internal(String),

    /// 네트워크 에러 (연결 실패, 타임아웃)
    #[error("네트워크 에러: {0}")]
    Network(String),

    /// 외부 엔드포인트의 Rate Limit 응답 (429)
    #[error("요청 한도 초과, {retry_after_secs}초 후 재시도")]
    RateLimit {
        /// 재시도 대기 시간 (초)
        retry_after_secs: u64,
    },

    /// 서비스 일시 불가 (503)
    #[error("서비스 일시 불가: {0}")]
    ServiceUnavailable(String),

    /// 시간당 알림 한도 초과로 전달하지 않음 (의도적 드롭)
    #[error("알림 전송 한도 초과: 시간당 {limit_per_hour}건")]
    AlertRateLimited {
        /// 설정된 시간당 한도
        limit_per_hour: u32,
    },

    /// 일부 채널 전달 실패
    #[error("partial failure: [{}]", format_failures(.failures))]
    PartialDelivery {
        /// 실패한 채널 목록 (채널 등록 순서)
        failures: Vec<ChannelFailure>,
    },

    /// 이미 실행 중인 컴포넌트를 다시 시작
    #[error("이미 실행 중: {0}")]
    AlreadyRunning(String),

    /// 실행 중이 아닌 컴포넌트를 정지
    #[error("실행 중이 아님: {0}")]
    NotRunning(String),

    /// I/O 에러
    #[error("I/O 에러: {0}")]
    Io(#[from] std::io::Error),
}

fn format_failures(failures: &[ChannelFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{}: {}", f.channel, f.message))
        .collect::<Vec<_>>()
        .join(", ")
}

impl CoreError {
    /// 유효성 검증 에러 생성 헬퍼
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// 재시도로 회복 가능한 전달 에러인지
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            CoreError::Network(_) | CoreError::ServiceUnavailable(_) | CoreError::RateLimit { .. }
        )
    }
}
