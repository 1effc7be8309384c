//! Conversion logic between source DTOs and domain samples.

use crate::domain::{BoundsShape, Point, PointerShape, Sample, SessionId, TrackError};
use crate::infrastructure::dto::source as dto;

// ========================================
// DTO → Domain Sample
// ========================================

impl From<dto::TokenSample> for Sample {
    fn from(dto: dto::TokenSample) -> Self {
        Sample::Token {
            symbol_id: dto.symbol_id,
            type_id: dto.type_id,
            user_id: dto.user_id,
            position: Point::new(dto.x, dto.y),
            angle: dto.angle,
        }
    }
}

impl From<dto::PointerSample> for Sample {
    fn from(dto: dto::PointerSample) -> Self {
        Sample::Pointer {
            key: dto.key,
            type_id: dto.type_id,
            user_id: dto.user_id,
            component_id: dto.component_id,
            position: Point::new(dto.x, dto.y),
            angle: dto.angle,
            shape: PointerShape {
                shear: dto.shear,
                radius: dto.radius,
                pressure: dto.pressure,
            },
        }
    }
}

impl From<dto::BoundsSample> for Sample {
    fn from(dto: dto::BoundsSample) -> Self {
        Sample::Bounds {
            key: dto.key,
            position: Point::new(dto.x, dto.y),
            angle: dto.angle,
            shape: BoundsShape {
                width: dto.width,
                height: dto.height,
                area: dto.area,
            },
        }
    }
}

impl From<dto::SymbolSample> for Sample {
    fn from(dto: dto::SymbolSample) -> Self {
        Sample::Symbol {
            key: dto.key,
            type_id: dto.type_id,
            user_id: dto.user_id,
            component_id: dto.component_id,
            group: dto.group,
            data: dto.data,
        }
    }
}

impl TryFrom<dto::SignalSample> for Sample {
    type Error = TrackError;

    fn try_from(dto: dto::SignalSample) -> Result<Self, Self::Error> {
        let targets = dto
            .targets
            .into_iter()
            .map(SessionId::new)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Sample::Signal {
            key: dto.key,
            component_id: dto.component_id,
            targets,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dto_pointer_to_domain() {
        // テスト項目: DTO の PointerSample がドメインのサンプルに変換される
        // given (前提条件):
        let dto_sample = dto::PointerSample {
            time: None,
            key: 7,
            type_id: 1,
            user_id: 2,
            component_id: 3,
            x: 0.25,
            y: 0.75,
            angle: 1.0,
            shear: 0.1,
            radius: 0.02,
            pressure: 0.5,
        };

        // when (操作):
        let sample: Sample = dto_sample.into();

        // then (期待する結果):
        assert_eq!(
            sample,
            Sample::Pointer {
                key: 7,
                type_id: 1,
                user_id: 2,
                component_id: 3,
                position: Point::new(0.25, 0.75),
                angle: 1.0,
                shape: PointerShape {
                    shear: 0.1,
                    radius: 0.02,
                    pressure: 0.5,
                },
            }
        );
    }

    #[test]
    fn test_dto_bounds_to_domain() {
        // テスト項目: DTO の BoundsSample がドメインのサンプルに変換される
        // given (前提条件):
        let dto_sample = dto::BoundsSample {
            time: Some(1.0),
            key: 2,
            x: 0.5,
            y: 0.5,
            angle: 0.0,
            width: 0.2,
            height: 0.1,
            area: 0.015,
        };

        // when (操作):
        let sample = Sample::from(dto_sample);

        // then (期待する結果):
        assert!(matches!(
            sample,
            Sample::Bounds { key: 2, shape, .. } if shape.width == 0.2 && shape.area == 0.015
        ));
    }

    #[test]
    fn test_dto_signal_targets_are_validated() {
        // テスト項目: SignalSample の対象 ID はセッション ID として検証される
        // given (前提条件):
        let valid = dto::SignalSample {
            time: None,
            key: 1,
            component_id: 0,
            targets: vec![1, 2],
        };
        let invalid = dto::SignalSample {
            targets: vec![i64::from(i32::MAX) + 1],
            ..valid.clone()
        };

        // when (操作):
        let valid_result = Sample::try_from(valid);
        let invalid_result = Sample::try_from(invalid);

        // then (期待する結果):
        assert!(matches!(
            valid_result,
            Ok(Sample::Signal { ref targets, .. }) if targets.len() == 2
        ));
        assert_eq!(
            invalid_result,
            Err(TrackError::InvalidSessionId(i64::from(i32::MAX) + 1))
        );
    }
}
