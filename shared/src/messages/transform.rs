use bitnet_serde::{BitReader, BitWriter, SerdeErr};
use glam::{Quat, Vec3};

use super::{message::Message, message_id};
use crate::types::NetId;

/// Position/rotation update for a spawned entity. Sent unreliably at high
/// rates, so the rotation rides the 32-bit smallest-three encoding.
#[derive(Clone, Debug, PartialEq)]
pub struct TransformMessage {
    pub net_id: NetId,
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for TransformMessage {
    fn default() -> Self {
        Self {
            net_id: 0,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

impl Message for TransformMessage {
    const ID: u8 = message_id::TRANSFORM;

    fn serialize(&self, writer: &mut BitWriter) -> Result<(), SerdeErr> {
        writer.write_u64_bits(self.net_id, 64)?;
        writer.write_f32(self.position.x)?;
        writer.write_f32(self.position.y)?;
        writer.write_f32(self.position.z)?;
        writer.write_quaternion_smallest_three(self.rotation)
    }

    fn deserialize(&mut self, reader: &mut BitReader) -> Result<(), SerdeErr> {
        self.net_id = reader.read_u64_bits(64)?;
        let x = reader.read_f32()?;
        let y = reader.read_f32()?;
        let z = reader.read_f32()?;
        self.position = Vec3::new(x, y, z);
        self.rotation = reader.read_quaternion_smallest_three()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use bitnet_serde::{BitReader, BitWriter};
    use glam::{Quat, Vec3};

    use super::TransformMessage;
    use crate::messages::message::Message;

    #[test]
    fn transform_round_trips_in_192_bits() {
        let message = TransformMessage {
            net_id: 9001,
            position: Vec3::new(-10.0, 0.5, 99.75),
            rotation: Quat::from_rotation_z(-0.4),
        };

        let mut writer = BitWriter::new();
        message.serialize(&mut writer).unwrap();
        assert_eq!(writer.bit_position(), 64 + 96 + 32);

        let buffer = writer.segment().to_vec();
        let mut reader = BitReader::new(&buffer);
        let mut out = TransformMessage::default();
        out.deserialize(&mut reader).unwrap();

        assert_eq!(out.net_id, message.net_id);
        assert_eq!(out.position, message.position);
        assert!(message.rotation.dot(out.rotation).abs() > 1.0 - 1e-4);
    }
}
