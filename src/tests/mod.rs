#[cfg(test)]
mod common;




#[cfg(test)]
mod writer_test;

#[cfg(test)]
mod roundtrip_test;
