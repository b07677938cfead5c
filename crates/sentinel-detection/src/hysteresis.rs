//! 히스테리시스 위반 필터.
//!
//! 비정상 신호가 임계값만큼 누적되면 위반 1건을 확정한다.
//! 정상 신호는 누적값을 1씩 감쇠시키고 감지를 다시 무장(re-arm)한다.
//!
//! - 비정상: `bad_streak += 1`, `bad_streak == threshold`이고 미발행 상태면 1건 발행
//! - 정상: `bad_streak > 0`이면 1 감소, `violation_open = false`
//!
//! 임계값 통과는 엣지 트리거(`==`)이므로 카운터는 반드시 신호당 1씩만 움직인다.

use sentinel_core::models::violation::CheatType;

use crate::classifier::Classification;

/// 연결별 히스테리시스 상태
#[derive(Debug, Clone)]
pub struct HysteresisFilter {
    threshold: u32,
    bad_streak: u32,
    violation_open: bool,
}

impl HysteresisFilter {
    /// 새 필터 생성 (초기 상태: streak 0, 미발행)
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold,
            bad_streak: 0,
            violation_open: false,
        }
    }

    /// 분류 결과 하나를 반영
    ///
    /// 위반이 확정되는 순간에만 임계값을 넘긴 신호의 카테고리를 반환한다.
    pub fn observe(&mut self, classification: Classification) -> Option<CheatType> {
        match classification {
            Classification::Unsafe(category) => {
                self.bad_streak = self.bad_streak.saturating_add(1);
                if self.bad_streak == self.threshold && !self.violation_open {
                    self.violation_open = true;
                    return Some(category);
                }
                None
            }
            Classification::Safe => {
                // 선형 감쇠: 한 번의 정상 프레임이 사건 전체를 지우지 않는다
                self.bad_streak = self.bad_streak.saturating_sub(1);
                self.violation_open = false;
                None
            }
        }
    }

    /// 초기 상태로 되돌림 (재페어링 시)
    pub fn reset(&mut self) {
        self.bad_streak = 0;
        self.violation_open = false;
    }

    pub fn bad_streak(&self) -> u32 {
        self.bad_streak
    }

    pub fn violation_open(&self) -> bool {
        self.violation_open
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }
}
