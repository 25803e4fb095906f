use core::cell::RefCell;
use core::convert::Infallible;

use embedded_hal::i2c::{
    Error, ErrorKind, ErrorType, NoAcknowledgeSource, Operation, SevenBitAddress,
};

/// Largest single transaction the fake bus records.
const MAX_TRANSACTION_LEN: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FakeI2cError(pub ErrorKind);

impl Error for FakeI2cError {
    fn kind(&self) -> ErrorKind {
        self.0
    }
}

/// One start..stop exchange seen on the bus.
#[derive(Debug)]
pub struct Transaction {
    pub address: u8,
    pub written: heapless::Vec<u8, MAX_TRANSACTION_LEN>,
    pub read: usize,
}

/// Records up to `N` transactions and serves up to `M` bytes of read data.
pub struct FakeI2cBus<const N: usize, const M: usize> {
    pub transactions: heapless::Vec<Transaction, N>,
    pub read_data: heapless::Vec<u8, M>,
    read_cursor: usize,
    fail_with: Option<ErrorKind>,
}

impl<const N: usize, const M: usize> ErrorType for FakeI2cBus<N, M> {
    type Error = FakeI2cError;
}

impl<const N: usize, const M: usize> FakeI2cBus<N, M> {
    pub fn new() -> Self {
        Self {
            transactions: heapless::Vec::new(),
            read_data: heapless::Vec::new(),
            read_cursor: 0,
            fail_with: None,
        }
    }

    pub fn new_with_read_data(read_data: &[u8]) -> Self {
        Self {
            read_data: heapless::Vec::from_slice(read_data).unwrap(),
            ..Self::new()
        }
    }

    /// Every following transaction fails with `kind` before any byte moves.
    pub fn failing(kind: ErrorKind) -> Self {
        Self {
            fail_with: Some(kind),
            ..Self::new()
        }
    }

    /// Bytes written by transaction `index`, control byte included.
    pub fn written(&self, index: usize) -> &[u8] {
        self.transactions[index].written.as_slice()
    }

    fn record(
        &mut self,
        address: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), FakeI2cError> {
        if let Some(kind) = self.fail_with {
            return Err(FakeI2cError(kind));
        }

        let mut transaction = Transaction {
            address,
            written: heapless::Vec::new(),
            read: 0,
        };

        for operation in operations {
            match operation {
                Operation::Write(write) => {
                    transaction
                        .written
                        .extend_from_slice(write)
                        .map_err(|_| FakeI2cError(ErrorKind::Overrun))?;
                }
                Operation::Read(read) => {
                    for byte in read.iter_mut() {
                        *byte = *self.read_data.get(self.read_cursor).ok_or(
                            FakeI2cError(ErrorKind::NoAcknowledge(
                                NoAcknowledgeSource::Data,
                            )),
                        )?;
                        self.read_cursor += 1;
                        transaction.read += 1;
                    }
                }
            }
        }

        self.transactions
            .push(transaction)
            .map_err(|_| FakeI2cError(ErrorKind::Overrun))?;

        Ok(())
    }
}

impl<const N: usize, const M: usize> embedded_hal::i2c::I2c for FakeI2cBus<N, M> {
    fn transaction(
        &mut self,
        address: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        self.record(address, operations)
    }
}

impl<const N: usize, const M: usize> embedded_hal_async::i2c::I2c for FakeI2cBus<N, M> {
    async fn transaction(
        &mut self,
        address: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        self.record(address, operations)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResetEvent {
    Low,
    High,
    DelayMs(u32),
    DelayNs(u32),
}

/// Shared, ordered log of what the reset pin and delay were asked to do.
#[derive(Default)]
pub struct ResetLog(RefCell<heapless::Vec<ResetEvent, 8>>);

impl ResetLog {
    fn push(&self, event: ResetEvent) {
        self.0.borrow_mut().push(event).unwrap();
    }

    pub fn events(&self) -> heapless::Vec<ResetEvent, 8> {
        self.0.borrow().clone()
    }
}

pub struct FakePin<'a>(pub &'a ResetLog);

impl embedded_hal::digital::ErrorType for FakePin<'_> {
    type Error = Infallible;
}

impl embedded_hal::digital::OutputPin for FakePin<'_> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0.push(ResetEvent::Low);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.0.push(ResetEvent::High);
        Ok(())
    }
}

pub struct FakeDelay<'a>(pub &'a ResetLog);

impl embedded_hal::delay::DelayNs for FakeDelay<'_> {
    fn delay_ns(&mut self, ns: u32) {
        self.0.push(ResetEvent::DelayNs(ns));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.0.push(ResetEvent::DelayMs(ms));
    }
}

impl embedded_hal_async::delay::DelayNs for FakeDelay<'_> {
    async fn delay_ns(&mut self, ns: u32) {
        self.0.push(ResetEvent::DelayNs(ns));
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.0.push(ResetEvent::DelayMs(ms));
    }
}
