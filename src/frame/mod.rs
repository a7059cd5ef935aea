//! Websocket data frame.
//!
//! [RFC-6455 Section5](https://datatracker.ietf.org/doc/html/rfc6455#section-5)
//!
//! ```text
//! 0                   1                   2                   3
//! 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-------+-+-------------+-------------------------------+
//! |F|R|R|R| opcode|M| Payload len |    Extended payload length    |
//! |I|S|S|S|  (4)  |A|     (7)     |             (16/64)           |
//! |N|V|V|V|       |S|             |   (if payload len==126/127)   |
//! | |1|2|3|       |K|             |                               |
//! +-+-+-+-+-------+-+-------------+ - - - - - - - - - - - - - - - +
//! |     Extended payload length continued, if payload len == 127  |
//! + - - - - - - - - - - - - - - - +-------------------------------+
//! |                               |Masking-key, if MASK set to 1  |
//! +-------------------------------+-------------------------------+
//! | Masking-key (continued)       |          Payload Data         |
//! +-------------------------------- - - - - - - - - - - - - - - - +
//! :                     Payload Data continued ...                :
//! + - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - +
//! |                     Payload Data continued ...                |
//! +---------------------------------------------------------------+
//! ```
//!
//! Only a subset is accepted: text and continuation frames, ping and pong
//! (ignored), and close. The 64-bit length form is always refused.

pub mod flag;
pub mod close;
pub mod length;
pub mod mask;

pub use flag::{Fin, OpCode};
pub use close::CloseCode;
pub use length::PayloadLen;
pub use mask::Mask;

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::FrameError;
use mask::apply_mask;

/// Websocket frame head.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHead {
    pub fin: Fin,
    pub opcode: OpCode,
    pub mask: Mask,
    pub length: PayloadLen,
}

impl FrameHead {
    /// Constructor.
    #[inline]
    pub const fn new(fin: Fin, opcode: OpCode, mask: Mask, length: PayloadLen) -> Self {
        Self {
            fin,
            opcode,
            mask,
            length,
        }
    }

    /// Encode to provided buffer, returns the count of written bytes.
    /// The 64-bit length form is never written,
    /// a [`FrameError::PayloadTooLarge`] error will be returned instead.
    pub fn encode(&self, buf: &mut BytesMut) -> Result<usize, FrameError> {
        let len = 2 + self.length.extended_len() + self.mask.key_len();
        buf.reserve(len);

        // fin, opcode
        buf.put_u8(self.fin as u8 | self.opcode as u8);

        // mask, payload length
        buf.put_u8(self.mask.to_flag() | self.length.to_flag());

        // extended payload length
        match &self.length {
            PayloadLen::Standard(_) => {}
            PayloadLen::Extended1(v) => buf.put_u16(*v),
            PayloadLen::Extended2 => return Err(FrameError::PayloadTooLarge),
        };

        // mask key
        match &self.mask {
            Mask::Key(k) => buf.put_slice(k),
            Mask::Skip => buf.put_slice(&[0u8; 4]),
            Mask::None => {}
        };

        Ok(len)
    }

    /// Parse from provided buffer, returns [`FrameHead`] and the count of read bytes
    /// if the parse succeeds.
    /// If there is not enough data to parse, a [`FrameError::NotEnoughData`] error
    /// will be returned.
    pub fn decode(buf: &[u8]) -> Result<(Self, usize), FrameError> {
        if buf.len() < 2 {
            return Err(FrameError::NotEnoughData);
        }

        let mut n: usize = 2;

        // fin, opcode
        let b1 = buf[0];

        // mask, payload length
        let b2 = buf[1];

        let fin = Fin::from_flag(b1)?;
        let opcode = OpCode::from_flag(b1)?;

        let mut mask = Mask::from_flag(b2);
        let mut length = PayloadLen::from_flag(b2);

        match length {
            PayloadLen::Standard(_) => {}
            PayloadLen::Extended1(_) => {
                if buf.len() - n < 2 {
                    return Err(FrameError::NotEnoughData);
                }

                length = PayloadLen::from_byte2([buf[2], buf[3]]);

                n += 2;
            }
            // messages over 65535 bytes are never accepted
            PayloadLen::Extended2 => return Err(FrameError::PayloadTooLarge),
        };

        if mask != Mask::None {
            if buf.len() - n < 4 {
                return Err(FrameError::NotEnoughData);
            }

            mask = Mask::from_key([buf[n], buf[n + 1], buf[n + 2], buf[n + 3]]);

            n += 4;
        }

        Ok((
            FrameHead {
                fin,
                opcode,
                mask,
                length,
            },
            n,
        ))
    }
}

/// Control frames this server accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Ping,
    Pong,
}

/// A decoded frame event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Ping or pong, the payload is consumed and dropped.
    Control(Control),
    /// Text or continuation frame with its unmasked payload.
    Data {
        fin: Fin,
        continuation: bool,
        payload: Vec<u8>,
    },
}

impl Frame {
    /// Decode one frame from the front of `buf`, returns the frame and
    /// the count of consumed bytes.
    ///
    /// Checks run in wire order: reserved bits, opcode, then length.
    /// A close frame is reported as [`FrameError::Close`] as soon as its
    /// first byte is seen. If the frame is not complete yet, a
    /// [`FrameError::NotEnoughData`] error is returned and nothing should
    /// be consumed.
    pub fn decode(buf: &[u8]) -> Result<(Self, usize), FrameError> {
        let b1 = *buf.first().ok_or(FrameError::NotEnoughData)?;

        Fin::from_flag(b1)?;
        if OpCode::from_flag(b1)? == OpCode::Close {
            return Err(FrameError::Close);
        }

        let (
            FrameHead {
                fin,
                opcode,
                mask,
                length,
            },
            head_n,
        ) = FrameHead::decode(buf)?;

        let len = length.to_num()?;

        if opcode.is_control() && (!fin.is_final() || len > 125) {
            return Err(FrameError::IllegalControl);
        }

        if buf.len() - head_n < len {
            return Err(FrameError::NotEnoughData);
        }

        let total = head_n + len;

        let frame = match opcode {
            OpCode::Ping => Frame::Control(Control::Ping),
            OpCode::Pong => Frame::Control(Control::Pong),
            OpCode::Text | OpCode::Continue => {
                let mut payload = buf[head_n..total].to_vec();
                // unmask payload data from client
                if let Mask::Key(key) = mask {
                    apply_mask(key, &mut payload);
                }
                Frame::Data {
                    fin,
                    continuation: opcode == OpCode::Continue,
                    payload,
                }
            }
            OpCode::Close => return Err(FrameError::Close),
        };

        Ok((frame, total))
    }
}

/// Encode `text` as a single unmasked, final text frame.
///
/// Servers never mask. The caller must keep the payload under 65536 bytes,
/// otherwise a [`FrameError::PayloadTooLarge`] error will be returned.
pub fn encode_text(text: &str) -> Result<Bytes, FrameError> {
    let head = FrameHead::new(
        Fin::Y,
        OpCode::Text,
        Mask::None,
        PayloadLen::from_num(text.len() as u64),
    );

    let mut buf = BytesMut::with_capacity(4 + text.len());
    head.encode(&mut buf)?;
    buf.put_slice(text.as_bytes());

    Ok(buf.freeze())
}

/// Encode a close frame carrying `code`.
pub fn encode_close(code: CloseCode) -> Bytes {
    let mut buf = BytesMut::with_capacity(4);
    buf.put_u8(Fin::Y as u8 | OpCode::Close as u8);
    buf.put_u8(2);
    buf.put_u16(code.to_num());
    buf.freeze()
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;

    /// Build a frame the way a client would send it.
    pub fn make_frame(b1: u8, payload: &[u8], key: Option<[u8; 4]>) -> Vec<u8> {
        let mut buf = BytesMut::new();
        buf.put_u8(b1);

        let mask = if key.is_some() { 0x80 } else { 0x00 };
        match PayloadLen::from_num(payload.len() as u64) {
            PayloadLen::Standard(n) => buf.put_u8(mask | n),
            PayloadLen::Extended1(n) => {
                buf.put_u8(mask | 126);
                buf.put_u16(n);
            }
            PayloadLen::Extended2 => {
                buf.put_u8(mask | 127);
                buf.put_u64(payload.len() as u64);
            }
        }

        let mut data = payload.to_vec();
        if let Some(key) = key {
            buf.put_slice(&key);
            apply_mask(key, &mut data);
        }
        buf.put_slice(&data);
        buf.to_vec()
    }

    pub fn text_frame(fin: bool, continuation: bool, payload: &[u8]) -> Vec<u8> {
        let fin_bit: u8 = if fin { 0x80 } else { 0x00 };
        let opcode: u8 = if continuation { 0x00 } else { 0x01 };
        make_frame(fin_bit | opcode, payload, Some(rand::random()))
    }

    #[test]
    fn frame_head() {
        let head = FrameHead {
            fin: Fin::Y,
            opcode: OpCode::Text,
            mask: Mask::Key([1, 2, 3, 4]),
            length: PayloadLen::from_num(4096),
        };

        let head2 = FrameHead {
            fin: Fin::N,
            opcode: OpCode::Continue,
            mask: Mask::None,
            length: PayloadLen::from_num(64),
        };

        for head in [head, head2] {
            let mut buf = BytesMut::new();

            let encode_n = head.encode(&mut buf).unwrap();
            assert_eq!(encode_n, buf.len());

            let (head2, decode_n) = FrameHead::decode(&buf).unwrap();

            assert_eq!(encode_n, decode_n);
            assert_eq!(head, head2);
        }
    }

    #[test]
    fn decode_masked_text() {
        for len in [0, 1, 2, 3, 4, 5, 125, 126, 127, 1000, 65535] {
            let payload: Vec<u8> = (0..len).map(|i| b'a' + (i % 26) as u8).collect();
            let frame = make_frame(0x81, &payload, Some(rand::random()));

            let (decoded, n) = Frame::decode(&frame).unwrap();
            assert_eq!(n, frame.len());
            assert_eq!(
                decoded,
                Frame::Data {
                    fin: Fin::Y,
                    continuation: false,
                    payload,
                }
            );
        }
    }

    #[test]
    fn decode_unmasked_text() {
        let frame = make_frame(0x01, b"\"hi\"", None);
        let (decoded, n) = Frame::decode(&frame).unwrap();

        assert_eq!(n, 6);
        assert_eq!(
            decoded,
            Frame::Data {
                fin: Fin::N,
                continuation: false,
                payload: b"\"hi\"".to_vec(),
            }
        );
    }

    #[test]
    fn decode_continuation() {
        let frame = make_frame(0x80, b"ef", Some([9, 8, 7, 6]));
        let (decoded, _) = Frame::decode(&frame).unwrap();

        assert_eq!(
            decoded,
            Frame::Data {
                fin: Fin::Y,
                continuation: true,
                payload: b"ef".to_vec(),
            }
        );
    }

    #[test]
    fn decode_reserved_bits() {
        for rsv in [0x10, 0x20, 0x40] {
            for opcode in 0x00..=0x0f {
                let frame = make_frame(0x80 | rsv | opcode, b"x", None);
                let err = Frame::decode(&frame).unwrap_err();
                assert_eq!(err, FrameError::ReservedBits);
                assert_eq!(err.close_code(), Some(CloseCode::PolicyViolation));
            }
        }
    }

    #[test]
    fn decode_opcode_policy() {
        for opcode in 0x02..=0x07 {
            let frame = make_frame(0x80 | opcode, b"x", None);
            let err = Frame::decode(&frame).unwrap_err();
            assert_eq!(err.close_code(), Some(CloseCode::WrongFrameFormat));
        }

        for opcode in 0x0b..=0x0f {
            let frame = make_frame(0x80 | opcode, b"x", None);
            let err = Frame::decode(&frame).unwrap_err();
            assert_eq!(err.close_code(), Some(CloseCode::PolicyViolation));
        }

        // the first byte is enough to see a close request
        let err = Frame::decode(&[0x88]).unwrap_err();
        assert_eq!(err, FrameError::Close);
        assert_eq!(err.close_code(), Some(CloseCode::NormalClose));
    }

    #[test]
    fn decode_control() {
        let ping = make_frame(0x89, b"ping", Some(rand::random()));
        let pong = make_frame(0x8a, b"", None);

        let mut buf = ping.clone();
        buf.extend_from_slice(&pong);

        let (frame, n) = Frame::decode(&buf).unwrap();
        assert_eq!(frame, Frame::Control(Control::Ping));
        assert_eq!(n, ping.len());

        let (frame, n2) = Frame::decode(&buf[n..]).unwrap();
        assert_eq!(frame, Frame::Control(Control::Pong));
        assert_eq!(n + n2, buf.len());

        let fragmented_ping = make_frame(0x09, b"", None);
        assert_eq!(
            Frame::decode(&fragmented_ping).unwrap_err(),
            FrameError::IllegalControl
        );
    }

    #[test]
    fn decode_too_large() {
        let frame = [0x81, 0xff, 0, 0, 0, 0, 0, 1, 0, 0];
        let err = Frame::decode(&frame).unwrap_err();
        assert_eq!(err, FrameError::PayloadTooLarge);
        assert_eq!(err.close_code(), Some(CloseCode::MessageTooLarge));

        // refused before the 8 length bytes arrive
        assert_eq!(
            Frame::decode(&[0x81, 0x7f]).unwrap_err(),
            FrameError::PayloadTooLarge
        );
    }

    #[test]
    fn decode_partial() {
        let frame = make_frame(0x81, &[b'x'; 300], Some(rand::random()));

        for end in 0..frame.len() {
            assert_eq!(
                Frame::decode(&frame[..end]).unwrap_err(),
                FrameError::NotEnoughData
            );
        }

        let (_, n) = Frame::decode(&frame).unwrap();
        assert_eq!(n, frame.len());
    }

    #[test]
    fn encode_length_forms() {
        for len in [0_usize, 1, 125, 126, 127, 1000, 65535] {
            let text = "x".repeat(len);
            let frame = encode_text(&text).unwrap();

            assert_eq!(frame[0], 0x81);
            if len < 126 {
                assert_eq!(frame[1] as usize, len);
                assert_eq!(frame.len(), 2 + len);
            } else {
                assert_eq!(frame[1], 126);
                assert_eq!(u16::from_be_bytes([frame[2], frame[3]]) as usize, len);
                assert_eq!(frame.len(), 4 + len);
            }

            // unmasked frames from the server decode as well
            let (decoded, n) = Frame::decode(&frame).unwrap();
            assert_eq!(n, frame.len());
            assert_eq!(
                decoded,
                Frame::Data {
                    fin: Fin::Y,
                    continuation: false,
                    payload: text.into_bytes(),
                }
            );
        }

        assert_eq!(
            encode_text(&"x".repeat(65536)).unwrap_err(),
            FrameError::PayloadTooLarge
        );
    }

    #[test]
    fn encode_close_frame() {
        let frame = encode_close(CloseCode::WrongDataFormat);
        assert_eq!(&frame[..], &[0x88, 0x02, 0x03, 0xef]);
    }
}
