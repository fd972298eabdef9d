use evmhost_abi::StatusCode;

/// Largest addressable memory, beyond which any access is out of gas.
const MAX_MEMORY: usize = 1 << 32;

/// Byte-addressed memory growing in 32-byte words.
#[derive(Debug, Default)]
pub struct Memory {
    data: Vec<u8>,
}

/// Total cost of holding `words` words of memory.
pub fn memory_cost(words: u64) -> u64 {
    3 * words + words * words / 512
}

fn words_for(bytes: usize) -> u64 {
    bytes.div_ceil(32) as u64
}

/// End of a non-empty access, or `None` for an empty one.
fn access_end(offset: usize, size: usize) -> Result<Option<usize>, StatusCode> {
    if size == 0 {
        return Ok(None);
    }
    offset
        .checked_add(size)
        .filter(|end| *end <= MAX_MEMORY)
        .map(Some)
        .ok_or(StatusCode::OutOfGas)
}

impl Memory {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Gas owed for growing memory over `offset..offset + size`. Memory is
    /// left untouched. Zero-sized ranges never grow memory.
    pub fn expansion_cost(&self, offset: usize, size: usize) -> Result<u64, StatusCode> {
        match access_end(offset, size)? {
            Some(end) if end > self.data.len() => {
                Ok(memory_cost(words_for(end)) - memory_cost(words_for(self.data.len())))
            }
            _ => Ok(0),
        }
    }

    /// Grows memory to cover `offset..offset + size`. The growth must already
    /// be paid for through [`Memory::expansion_cost`].
    pub fn expand(&mut self, offset: usize, size: usize) -> Result<(), StatusCode> {
        if let Some(end) = access_end(offset, size)? {
            if end > self.data.len() {
                self.data.resize(words_for(end) as usize * 32, 0);
            }
        }
        Ok(())
    }

    /// Reads a range previously covered by [`Memory::expand`].
    pub fn slice(&self, offset: usize, size: usize) -> &[u8] {
        if size == 0 {
            return &[];
        }
        &self.data[offset..offset + size]
    }

    pub fn write(&mut self, offset: usize, bytes: &[u8]) {
        self.data[offset..offset + bytes.len()].copy_from_slice(bytes);
    }
}
