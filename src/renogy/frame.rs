use crate::prelude::*;
use crate::renogy::registers::{BLOCK_LEN, REGISTER_COUNT, START_REGISTER};

use num_enum::{IntoPrimitive, TryFromPrimitive};

pub const DEFAULT_SLAVE_ID: u8 = 1;

const EXCEPTION_FLAG: u8 = 0x80;

// {{{ FunctionCode
#[derive(Clone, Copy, Debug, Eq, PartialEq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum FunctionCode {
    ReadHolding = 0x03,
    WriteMultiple = 0x10,
}
// }}}

fn checksum(data: &[u8]) -> [u8; 2] {
    crc16::State::<crc16::MODBUS>::calculate(data).to_le_bytes()
}

fn with_checksum(mut frame: Vec<u8>) -> Vec<u8> {
    let crc = checksum(&frame);
    frame.extend_from_slice(&crc);
    frame
}

/// Splits off and verifies the trailing CRC, returning the frame body.
fn verify(frame: &[u8], min_len: usize) -> Result<&[u8], CodecError> {
    if frame.len() < min_len {
        return Err(CodecError::Frame(format!(
            "frame is {} bytes, need at least {}",
            frame.len(),
            min_len
        )));
    }

    let (body, crc) = frame.split_at(frame.len() - 2);
    let expected = checksum(body);
    if crc != expected {
        return Err(CodecError::Checksum {
            expected,
            actual: [crc[0], crc[1]],
        });
    }

    Ok(body)
}

fn check_header(body: &[u8], slave_id: u8, function: FunctionCode) -> Result<(), CodecError> {
    if body[0] != slave_id {
        return Err(CodecError::Frame(format!(
            "reply from slave {}, expected {}",
            body[0], slave_id
        )));
    }

    let code = u8::from(function);
    match body[1] {
        c if c == code => Ok(()),
        c if c == code | EXCEPTION_FLAG => Err(CodecError::Exception(body[2])),
        c => Err(CodecError::Frame(format!(
            "unexpected function code {:#04x}, expected {:#04x}",
            c, code
        ))),
    }
}

// {{{ ReadRequest
/// Read Holding Registers request for the whole dynamic information block.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ReadRequest {
    pub slave_id: u8,
    pub register: u16,
    pub count: u16,
}

impl ReadRequest {
    pub fn new(slave_id: u8) -> Self {
        Self {
            slave_id,
            register: START_REGISTER,
            count: REGISTER_COUNT,
        }
    }

    pub fn bytes(&self) -> Vec<u8> {
        let mut frame = vec![self.slave_id, FunctionCode::ReadHolding.into()];
        frame.extend_from_slice(&self.register.to_be_bytes());
        frame.extend_from_slice(&self.count.to_be_bytes());
        with_checksum(frame)
    }
}
// }}}

// {{{ ReadResponse
pub struct ReadResponse;

impl ReadResponse {
    /// Validates a reply to [`ReadRequest`] and returns the register block
    /// it carries.
    pub fn decode(frame: &[u8], slave_id: u8) -> Result<Vec<u8>, CodecError> {
        // slave, function, byte count / exception code, crc
        let body = verify(frame, 5)?;
        check_header(body, slave_id, FunctionCode::ReadHolding)?;

        let byte_count = body[2] as usize;
        let values = &body[3..];
        if values.len() != byte_count {
            return Err(CodecError::Frame(format!(
                "byte count {} but {} value bytes",
                byte_count,
                values.len()
            )));
        }
        if byte_count != BLOCK_LEN {
            return Err(CodecError::length(BLOCK_LEN, byte_count));
        }

        trace!("read response from slave {}: {:02x?}", slave_id, values);
        Ok(values.to_vec())
    }
}
// }}}

// {{{ WriteRequest
/// Write Multiple Registers request putting an encoded snapshot back at
/// 0x100.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WriteRequest {
    pub slave_id: u8,
    pub register: u16,
    pub values: Vec<u8>,
}

impl WriteRequest {
    pub fn new(slave_id: u8, snapshot: &Snapshot) -> Result<Self, CodecError> {
        Ok(Self {
            slave_id,
            register: START_REGISTER,
            values: snapshot.encode()?,
        })
    }

    pub fn count(&self) -> u16 {
        (self.values.len() / 2) as u16
    }

    pub fn bytes(&self) -> Vec<u8> {
        let mut frame = vec![self.slave_id, FunctionCode::WriteMultiple.into()];
        frame.extend_from_slice(&self.register.to_be_bytes());
        frame.extend_from_slice(&self.count().to_be_bytes());
        frame.push(self.values.len() as u8);
        frame.extend_from_slice(&self.values);
        with_checksum(frame)
    }
}
// }}}

// {{{ WriteResponse
pub struct WriteResponse;

impl WriteResponse {
    /// Validates the echo the device sends after a [`WriteRequest`].
    pub fn decode(frame: &[u8], request: &WriteRequest) -> Result<(), CodecError> {
        let body = verify(frame, 5)?;
        check_header(body, request.slave_id, FunctionCode::WriteMultiple)?;

        if body.len() != 6 {
            return Err(CodecError::Frame(format!("write echo is {} bytes", body.len() + 2)));
        }

        let register = u16::from_be_bytes([body[2], body[3]]);
        let count = u16::from_be_bytes([body[4], body[5]]);
        if (register, count) != (request.register, request.count()) {
            return Err(CodecError::Frame(format!(
                "write echo for register {:#06x} count {}, sent {:#06x} count {}",
                register,
                count,
                request.register,
                request.count()
            )));
        }

        Ok(())
    }
}
// }}}
