//! # syncpulse-alert
//!
//! 알림 디스패처. 시간당 한도 검사와 이력 추가를 하나의 잠금 안에서 수행한 뒤
//! 잠금을 풀고 활성화된 채널들로 동시에 전달한다.

pub mod dispatcher;
pub mod history;

pub use dispatcher::AlertDispatcher;
pub use history::AlertHistory;
