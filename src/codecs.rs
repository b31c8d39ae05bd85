pub mod counted {
    use declio::{Decode, Encode, Error};

    use crate::constants;

    pub fn encode<A, Ctx, W>(elems: &[A], ctx: Ctx, writer: &mut W) -> Result<(), Error>
    where
        A: Encode<Ctx>,
        Ctx: Copy,
        W: std::io::Write,
    {
        (elems.len() as u32).encode(constants::ENDIANESS, writer)?;
        for elem in elems {
            elem.encode(ctx, writer)?;
        }
        Ok(())
    }

    pub fn decode<A, Ctx, R>(ctx: Ctx, reader: &mut R) -> Result<Vec<A>, Error>
    where
        A: Decode<Ctx>,
        Ctx: Copy,
        R: std::io::Read,
    {
        let len = u32::decode(constants::ENDIANESS, reader)?;
        let mut elems = Vec::with_capacity(len.min(4096) as usize);
        for _ in 0..len {
            elems.push(A::decode(ctx, reader)?);
        }
        Ok(elems)
    }
}

pub mod short_str {
    use std::io::Read;

    use declio::{Decode, Encode, Error};

    pub fn encode<Ctx, W>(val: &str, _ctx: Ctx, writer: &mut W) -> Result<(), Error>
    where
        W: std::io::Write,
    {
        if val.len() > u8::MAX as usize {
            return Err(Error::new("identifier longer than 255 bytes"));
        }
        (val.len() as u8).encode((), writer)?;
        writer.write_all(val.as_bytes())?;
        Ok(())
    }

    pub fn decode<Ctx, R>(_ctx: Ctx, reader: &mut R) -> Result<String, Error>
    where
        R: std::io::Read,
    {
        let len = u8::decode((), reader)?;
        let mut buf = vec![0; len as usize];
        reader.read_exact(&mut buf)?;
        String::from_utf8(buf).map_err(Error::wrap)
    }
}

pub mod f64_bits {
    use declio::{Decode, Encode, Error};

    use crate::constants;

    pub fn encode<Ctx, W>(val: &f64, _ctx: Ctx, writer: &mut W) -> Result<(), Error>
    where
        W: std::io::Write,
    {
        val.to_bits().encode(constants::ENDIANESS, writer)
    }

    pub fn decode<Ctx, R>(_ctx: Ctx, reader: &mut R) -> Result<f64, Error>
    where
        R: std::io::Read,
    {
        Ok(f64::from_bits(u64::decode(constants::ENDIANESS, reader)?))
    }
}
