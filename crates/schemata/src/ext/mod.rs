pub(crate) mod cmp;
