use bitnet_serde::{BitReader, BitWriter, FixedBytes, SerdeErr};
use glam::{Quat, Vec3};

use super::{message::Message, message_id};
use crate::types::NetId;

/// Instructs the remote side to instantiate the given prefab with the
/// given network identity and initial transform.
#[derive(Clone, Debug, PartialEq)]
pub struct SpawnMessage {
    pub prefab_id: FixedBytes<16>,
    pub net_id: NetId,
    /// Whether the receiving connection owns the spawned entity.
    pub owned: bool,
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for SpawnMessage {
    fn default() -> Self {
        Self {
            prefab_id: FixedBytes::default(),
            net_id: 0,
            owned: false,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

impl Message for SpawnMessage {
    const ID: u8 = message_id::SPAWN;

    fn serialize(&self, writer: &mut BitWriter) -> Result<(), SerdeErr> {
        self.prefab_id.ser(writer)?;
        writer.write_u64_bits(self.net_id, 64)?;
        writer.write_bool(self.owned)?;
        writer.write_f32(self.position.x)?;
        writer.write_f32(self.position.y)?;
        writer.write_f32(self.position.z)?;
        writer.write_quaternion_smallest_three(self.rotation)
    }

    fn deserialize(&mut self, reader: &mut BitReader) -> Result<(), SerdeErr> {
        self.prefab_id = FixedBytes::de(reader)?;
        self.net_id = reader.read_u64_bits(64)?;
        self.owned = reader.read_bool()?;
        let x = reader.read_f32()?;
        let y = reader.read_f32()?;
        let z = reader.read_f32()?;
        self.position = Vec3::new(x, y, z);
        self.rotation = reader.read_quaternion_smallest_three()?;
        Ok(())
    }
}

/// Instructs the remote side to tear a spawned entity back down.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UnspawnMessage {
    pub net_id: NetId,
}

impl Message for UnspawnMessage {
    const ID: u8 = message_id::UNSPAWN;

    fn serialize(&self, writer: &mut BitWriter) -> Result<(), SerdeErr> {
        writer.write_u64_bits(self.net_id, 64)
    }

    fn deserialize(&mut self, reader: &mut BitReader) -> Result<(), SerdeErr> {
        self.net_id = reader.read_u64_bits(64)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use bitnet_serde::{BitReader, BitWriter, FixedBytes};
    use glam::{Quat, Vec3};

    use super::{SpawnMessage, UnspawnMessage};
    use crate::messages::message::Message;

    #[test]
    fn spawn_round_trips() {
        let message = SpawnMessage {
            prefab_id: FixedBytes::new(*b"player-prefab-01"),
            net_id: 0xFEED_F00D_1234_5678,
            owned: true,
            position: Vec3::new(1.5, -2.0, 300.25),
            rotation: Quat::from_rotation_y(1.1),
        };

        // Write
        let mut writer = BitWriter::new();
        message.serialize(&mut writer).unwrap();
        // 128 prefab + 64 netId + 1 owned + 96 position + 32 rotation
        assert_eq!(writer.bit_position(), 321);

        // Read
        let buffer = writer.segment().to_vec();
        let mut reader = BitReader::new(&buffer);
        let mut out = SpawnMessage::default();
        out.deserialize(&mut reader).unwrap();

        assert_eq!(out.prefab_id, message.prefab_id);
        assert_eq!(out.net_id, message.net_id);
        assert_eq!(out.owned, message.owned);
        assert_eq!(out.position, message.position);
        assert!(message.rotation.dot(out.rotation).abs() > 1.0 - 1e-4);
    }

    #[test]
    fn unspawn_round_trips() {
        let message = UnspawnMessage { net_id: 42 };

        let mut writer = BitWriter::new();
        message.serialize(&mut writer).unwrap();
        assert_eq!(writer.bit_position(), 64);

        let buffer = writer.segment().to_vec();
        let mut reader = BitReader::new(&buffer);
        let mut out = UnspawnMessage::default();
        out.deserialize(&mut reader).unwrap();
        assert_eq!(out, message);
    }

    #[test]
    fn truncated_spawn_fails() {
        let message = SpawnMessage::default();
        let mut writer = BitWriter::new();
        message.serialize(&mut writer).unwrap();

        let buffer = writer.segment().to_vec();
        let mut reader = BitReader::new(&buffer[..20]);
        let mut out = SpawnMessage::default();
        assert!(out.deserialize(&mut reader).is_err());
    }
}
