use std::f32::consts::FRAC_1_SQRT_2;

use glam::Quat;

use crate::{bit_reader::BitReader, bit_writer::BitWriter, error::SerdeErr};

// Smallest-three layout: 2 bits for the index of the dropped (largest)
// component, then the remaining three quantized to 10-bit signed values.
// Each survivor lies in [-1/sqrt(2), 1/sqrt(2)] once the quaternion is
// flipped so the dropped component is non-negative.
const COMPONENT_MAX: i32 = 511;
const SMALLEST_THREE_BITS: usize = 2 + 3 * 10;

impl BitWriter {
    /// Writes all four components as raw floats (128 bits), x,y,z,w order.
    pub fn write_quaternion(&mut self, q: Quat) -> Result<(), SerdeErr> {
        if self.space_bits() < 128 {
            return Err(SerdeErr);
        }
        self.write_f32(q.x)?;
        self.write_f32(q.y)?;
        self.write_f32(q.z)?;
        self.write_f32(q.w)
    }

    /// Writes a rotation in 32 bits using smallest-three compression.
    ///
    /// The largest-magnitude component is dropped and recomputed by the
    /// reader; `q` and `-q` encode the same rotation, so the quaternion is
    /// flipped when the dropped component is negative.
    pub fn write_quaternion_smallest_three(&mut self, q: Quat) -> Result<(), SerdeErr> {
        if self.space_bits() < SMALLEST_THREE_BITS {
            return Err(SerdeErr);
        }

        let components = [q.x, q.y, q.z, q.w];
        let mut largest = 0;
        for i in 1..4 {
            if components[i].abs() > components[largest].abs() {
                largest = i;
            }
        }
        let flip = components[largest] < 0.0;

        self.write_u32_bits(largest as u32, 2)?;
        for (i, &component) in components.iter().enumerate() {
            if i == largest {
                continue;
            }
            let value = if flip { -component } else { component };
            let scaled = ((value / FRAC_1_SQRT_2) * COMPONENT_MAX as f32).round() as i32;
            self.write_i32_ranged(scaled.clamp(-COMPONENT_MAX, COMPONENT_MAX), -COMPONENT_MAX, COMPONENT_MAX)?;
        }
        Ok(())
    }
}

impl BitReader<'_> {
    /// Reads four raw floats written by [`BitWriter::write_quaternion`].
    pub fn read_quaternion(&mut self) -> Result<Quat, SerdeErr> {
        if self.remaining_bits() < 128 {
            return Err(SerdeErr);
        }
        let x = self.read_f32()?;
        let y = self.read_f32()?;
        let z = self.read_f32()?;
        let w = self.read_f32()?;
        Ok(Quat::from_xyzw(x, y, z, w))
    }

    /// Reads a smallest-three rotation. The dropped component is
    /// reconstructed with a positive sign and the result is normalized.
    pub fn read_quaternion_smallest_three(&mut self) -> Result<Quat, SerdeErr> {
        if self.remaining_bits() < SMALLEST_THREE_BITS {
            return Err(SerdeErr);
        }

        let largest = self.read_u32_bits(2)? as usize;
        let mut components = [0.0f32; 4];
        let mut sum_of_squares = 0.0f32;
        for (i, slot) in components.iter_mut().enumerate() {
            if i == largest {
                continue;
            }
            let scaled = self.read_i32_ranged(-COMPONENT_MAX, COMPONENT_MAX)?;
            let value = (scaled as f32 / COMPONENT_MAX as f32) * FRAC_1_SQRT_2;
            *slot = value;
            sum_of_squares += value * value;
        }
        components[largest] = (1.0 - sum_of_squares).max(0.0).sqrt();

        let [x, y, z, w] = components;
        Ok(Quat::from_xyzw(x, y, z, w).normalize())
    }
}

#[cfg(test)]
mod tests {
    use glam::Quat;

    use crate::{BitReader, BitWriter};

    fn round_trip(q: Quat) -> Quat {
        let mut writer = BitWriter::new();
        writer.write_quaternion_smallest_three(q).unwrap();
        assert_eq!(writer.bit_position(), 32);

        let buffer = writer.segment().to_vec();
        let mut reader = BitReader::new(&buffer);
        reader.read_quaternion_smallest_three().unwrap()
    }

    #[test]
    fn identity_survives_compression() {
        let out = round_trip(Quat::IDENTITY);

        assert!((out.x - 0.0).abs() < 1e-3);
        assert!((out.y - 0.0).abs() < 1e-3);
        assert!((out.z - 0.0).abs() < 1e-3);
        assert!((out.w - 1.0).abs() < 1e-3);
        assert!((out.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn rotations_survive_compression() {
        let cases = [
            Quat::from_rotation_x(1.0),
            Quat::from_rotation_y(-2.5),
            Quat::from_rotation_z(0.3),
            Quat::from_euler(glam::EulerRot::XYZ, 0.5, 1.2, -0.7),
            Quat::from_euler(glam::EulerRot::XYZ, -3.0, 0.01, 2.2),
        ];

        for q in cases {
            let out = round_trip(q);
            // q and -q are the same rotation
            let dot = q.dot(out).abs();
            assert!(dot > 1.0 - 1e-4, "rotation drifted: dot = {}", dot);
            assert!((out.length() - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn negative_largest_component_is_flipped() {
        let q = Quat::from_xyzw(0.0, 0.0, 0.0, -1.0);
        let out = round_trip(q);

        // encoded as the equivalent positive-w rotation
        assert!((out.w - 1.0).abs() < 1e-3);
    }

    #[test]
    fn uncompressed_quaternion_round_trips_exactly() {
        let q = Quat::from_euler(glam::EulerRot::XYZ, 0.5, 1.2, -0.7);

        let mut writer = BitWriter::new();
        writer.write_quaternion(q).unwrap();
        assert_eq!(writer.bit_position(), 128);

        let buffer = writer.segment().to_vec();
        let mut reader = BitReader::new(&buffer);
        assert_eq!(reader.read_quaternion().unwrap(), q);
    }

    #[test]
    fn compression_fails_atomically_without_space() {
        let mut writer = BitWriter::with_capacity(4);
        writer.write_u32_bits(0, 10).unwrap();

        assert!(writer
            .write_quaternion_smallest_three(Quat::IDENTITY)
            .is_err());
        assert_eq!(writer.bit_position(), 10);
    }
}
