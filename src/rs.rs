//! ## Reed-Solomon codes
//!
//! The CD uses two short Reed-Solomon codes over GF(256): C2 is (28,24) with
//! its four parity bytes in the middle of the codeword, C1 is (32,28) with
//! parity at the end.  Both have roots at alpha^0..alpha^3, i.e. a codeword
//! is valid when all four syndromes S_k = sum_i c_i * alpha^(i*k) vanish.
//!
//! Because the parity does not sit at the low end of the codeword, plain
//! polynomial-division encoding does not apply; the two production encoders
//! here are matrix encoders with precomputed log-domain coefficients.  A
//! generic systematic encoder with a cached generator polynomial is kept for
//! callers that want an end-parity code of arbitrary strength.
//!
//! Decoding support stops at analysis: syndromes, erasure folding,
//! Berlekamp-Massey and a Chien search locate errata, but nothing here
//! applies a correction.

use crate::gf;
use crate::DYNERR;

#[derive(thiserror::Error,Debug)]
pub enum RsError {
    #[error("message length does not match the code")]
    MessageLength,
    #[error("parity count out of range")]
    ParityCount
}

/// Log-domain encoder matrix for C1 (32,28): parity[j] of a codeword
/// [msg(28) | parity(4)] is the xor over i of alpha^(log msg[i] + C1_COEFFS[i][j]).
const C1_COEFFS: [[u8;4];28] = [
    [165, 118, 232,  55],
    [ 61, 168, 179,  96],
    [102, 137,  47, 116],
    [122, 121, 214, 182],
    [188, 127, 184,  80],
    [ 86, 224, 221,  81],
    [ 87,  67,   8,  63],
    [ 69,  40,  78,  77],
    [ 83,  56,  85, 181],
    [187, 178, 209,  41],
    [ 47, 136, 185,  19],
    [ 25,  49, 196,  48],
    [ 54,  72, 154, 104],
    [110, 194,  15, 155],
    [161,  38, 180,  59],
    [ 65, 136,  71,  16],
    [ 22, 246, 120, 113],
    [119, 178, 205, 137],
    [143, 115, 232,  62],
    [ 68, 108, 138,  58],
    [ 64,  85, 183,  16],
    [ 22, 130, 209, 110],
    [116, 136,  47, 184],
    [190,  78, 156, 125],
    [131,  34, 235, 116],
    [122, 186, 147, 151],
    [157, 180,  47,  66],
    [ 72, 243,  69, 249]
];

/// Log-domain encoder matrix for C2 (28,24): parity sits at codeword
/// positions 12..=15, so the codeword is [msg[0..12] | parity | msg[12..24]].
const C2_COEFFS: [[u8;4];24] = [
    [ 22, 246, 120, 113],
    [119, 178, 205, 137],
    [143, 115, 232,  62],
    [ 68, 108, 138,  58],
    [ 64,  85, 183,  16],
    [ 22, 130, 209, 110],
    [116, 136,  47, 184],
    [190,  78, 156, 125],
    [131,  34, 235, 116],
    [122, 186, 147, 151],
    [157, 180,  47,  66],
    [ 72, 243,  69, 249],
    [  6,  78, 249,  75],
    [ 81,  59, 189, 163],
    [169, 162, 198, 131],
    [137, 253,  49, 143],
    [149, 177,  96, 205],
    [211,  71, 157, 134],
    [140, 236, 154,  43],
    [ 49, 213, 112,  88],
    [ 94, 171, 138,  95],
    [101,  13, 148, 173],
    [179, 244, 214, 152],
    [158, 162,  30,  58]
];

/// C1 parity over a 28-byte message, to be appended at codeword positions 28..=31
pub fn c1_parity(msg: &[u8]) -> Result<[u8;4],DYNERR> {
    if msg.len() != 28 {
        return Err(Box::new(RsError::MessageLength));
    }
    let mut parity = [0u8;4];
    for (i,&m) in msg.iter().enumerate() {
        if m==0 {
            continue;
        }
        let l = gf::log(m);
        for j in 0..4 {
            parity[j] ^= gf::pow(l + C1_COEFFS[i][j] as usize);
        }
    }
    Ok(parity)
}

/// C2 parity over a 24-byte message, belongs at codeword positions 12..=15
pub fn c2_parity(msg: &[u8]) -> Result<[u8;4],DYNERR> {
    if msg.len() != 24 {
        return Err(Box::new(RsError::MessageLength));
    }
    let mut parity = [0u8;4];
    for (i,&m) in msg.iter().enumerate() {
        if m==0 {
            continue;
        }
        let l = gf::log(m);
        for j in 0..4 {
            parity[j] ^= gf::pow(l + C2_COEFFS[i][j] as usize);
        }
    }
    Ok(parity)
}

/// Cache of generator polynomials g(x) = prod_{i=0..n-1} (x - alpha^i),
/// keyed by parity count.  Coefficients are stored low degree first and the
/// implicit leading coefficient is 1.
pub struct GeneratorCache {
    polys: [Option<Vec<u8>>;33]
}

impl GeneratorCache {
    pub fn new() -> Self {
        Self { polys: std::array::from_fn(|_| None) }
    }
    /// get (building if necessary) the generator for `n_syms` parity symbols
    pub fn generator(&mut self,n_syms: usize) -> Result<&[u8],DYNERR> {
        if n_syms > 32 {
            return Err(Box::new(RsError::ParityCount));
        }
        if self.polys[n_syms].is_none() {
            let mut g = vec![1u8];
            for i in 0..n_syms {
                let root = gf::pow(i);
                let mut next = vec![0u8;g.len()+1];
                for (j,&c) in g.iter().enumerate() {
                    next[j+1] ^= c;
                    next[j] ^= gf::mul(c,root);
                }
                g = next;
            }
            self.polys[n_syms] = Some(g);
        }
        Ok(self.polys[n_syms].as_ref().unwrap())
    }
    /// Systematic encode by polynomial division: returns `n_syms` parity
    /// bytes to append after the message.  The first message byte is the
    /// highest-degree coefficient.
    pub fn encode(&mut self,msg: &[u8],n_syms: usize) -> Result<Vec<u8>,DYNERR> {
        let g = self.generator(n_syms)?.to_vec();
        if n_syms==0 {
            return Ok(Vec::new());
        }
        let mut rem = vec![0u8;n_syms];
        for &byte in msg {
            let feedback = byte ^ rem[n_syms-1];
            rem.rotate_right(1);
            rem[0] = 0;
            if feedback != 0 {
                for (r,&gc) in rem.iter_mut().zip(&g[..n_syms]) {
                    *r ^= gf::mul(gc,feedback);
                }
            }
        }
        Ok(rem)
    }
}

/// Syndromes S_k = sum_i c_i * alpha^(i*k) for k=0..3; all zero for a valid
/// C1 or C2 codeword.
pub fn syndromes(codeword: &[u8]) -> [u8;4] {
    let mut out = [0u8;4];
    for k in 0..4 {
        let mut s = 0u8;
        for (i,&c) in codeword.iter().enumerate() {
            if c != 0 {
                s ^= gf::pow(gf::log(c) + i*k);
            }
        }
        out[k] = s;
    }
    out
}

/// Evaluate a polynomial (low degree first) at x
fn poly_eval(poly: &[u8],x: u8) -> u8 {
    let mut acc = 0u8;
    for &c in poly.iter().rev() {
        acc = gf::mul(acc,x) ^ c;
    }
    acc
}

/// Fold known erasure positions into the syndromes: S'(x) = S(x) * Gamma(x)
/// mod x^4 with Gamma(x) = prod_j (1 - alpha^(e_j) x).  Berlekamp-Massey
/// should then run on the last 4 - rho entries of the result.
pub fn forney_syndromes(synd: &[u8;4],erasures: &[usize]) -> [u8;4] {
    let mut gamma = vec![1u8];
    for &e in erasures {
        let xe = gf::pow(e);
        let mut next = vec![0u8;gamma.len()+1];
        for (i,&c) in gamma.iter().enumerate() {
            next[i] ^= c;
            next[i+1] ^= gf::mul(c,xe);
        }
        gamma = next;
    }
    let mut out = [0u8;4];
    for k in 0..4 {
        let mut v = 0u8;
        for (i,&c) in gamma.iter().enumerate() {
            if i <= k {
                v ^= gf::mul(c,synd[k-i]);
            }
        }
        out[k] = v;
    }
    out
}

/// Berlekamp-Massey: find the error locator polynomial Lambda(x) (low degree
/// first, Lambda(0) = 1) for the given syndrome sequence.
pub fn berlekamp_massey(synd: &[u8]) -> Vec<u8> {
    let mut lambda = vec![1u8];
    let mut b = vec![1u8];
    let mut l: usize = 0;
    let mut m: usize = 1;
    let mut d_prime: u8 = 1;
    for n in 0..synd.len() {
        let mut d = synd[n];
        for i in 1..=l {
            if i < lambda.len() && lambda[i] != 0 {
                d ^= gf::mul(lambda[i],synd[n-i]);
            }
        }
        if d==0 {
            m += 1;
            continue;
        }
        let prev = lambda.clone();
        let scale = gf::mul(d,gf::inv(d_prime));
        if lambda.len() < b.len() + m {
            lambda.resize(b.len() + m,0);
        }
        for (i,&bc) in b.iter().enumerate() {
            if bc != 0 {
                lambda[i+m] ^= gf::mul(scale,bc);
            }
        }
        if 2*l <= n {
            l = n + 1 - l;
            d_prime = d;
            b = prev;
            m = 1;
        } else {
            m += 1;
        }
    }
    while lambda.len() > 1 && *lambda.last().unwrap()==0 {
        lambda.pop();
    }
    lambda
}

/// Chien search: positions p in 0..n where Lambda(alpha^-p) = 0
pub fn chien_search(lambda: &[u8],n: usize) -> Vec<usize> {
    let mut out = Vec::new();
    for pos in 0..n {
        let x = gf::pow(255 - (pos % 255));
        if poly_eval(lambda,x)==0 {
            out.push(pos);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c1_codeword(msg: &[u8]) -> Vec<u8> {
        let mut cw = msg.to_vec();
        cw.extend_from_slice(&c1_parity(msg).unwrap());
        cw
    }

    fn c2_codeword(msg: &[u8]) -> Vec<u8> {
        let p = c2_parity(msg).unwrap();
        let mut cw = msg[0..12].to_vec();
        cw.extend_from_slice(&p);
        cw.extend_from_slice(&msg[12..24]);
        cw
    }

    #[test]
    fn parity_vectors() {
        let ramp28: Vec<u8> = (0..28).collect();
        let ramp24: Vec<u8> = (0..24).collect();
        assert_eq!(c1_parity(&ramp28).unwrap(),[0xc3,0xf9,0x1e,0x24]);
        assert_eq!(c2_parity(&ramp24).unwrap(),[0x4b,0xc9,0x02,0x80]);
        assert_eq!(c1_parity(&[0xff;28]).unwrap(),[0x32,0x18,0x9a,0xb0]);
        assert_eq!(c2_parity(&[0xff;24]).unwrap(),[0x95,0x40,0xd6,0x03]);
        assert_eq!(c1_parity(&[0;28]).unwrap(),[0,0,0,0]);
        assert_eq!(c2_parity(&[0;24]).unwrap(),[0,0,0,0]);
    }

    #[test]
    fn bad_lengths() {
        assert!(c1_parity(&[0;27]).is_err());
        assert!(c2_parity(&[0;28]).is_err());
    }

    #[test]
    fn syndromes_vanish() {
        let msg: Vec<u8> = (0..28).map(|i| (i*37+11) as u8).collect();
        assert_eq!(syndromes(&c1_codeword(&msg)),[0,0,0,0]);
        let msg: Vec<u8> = (0..24).map(|i| (i*53+7) as u8).collect();
        assert_eq!(syndromes(&c2_codeword(&msg)),[0,0,0,0]);
    }

    #[test]
    fn linearity() {
        // C2(a*x + b*y) = a*C2(x) + b*C2(y)
        let x: Vec<u8> = (0..24).map(|i| (i*19+3) as u8).collect();
        let y: Vec<u8> = (0..24).map(|i| (i*91+40) as u8).collect();
        let (a,b) = (0x35u8,0xd2u8);
        let mix: Vec<u8> = (0..24).map(|i| crate::gf::mul(a,x[i]) ^ crate::gf::mul(b,y[i])).collect();
        let px = c2_parity(&x).unwrap();
        let py = c2_parity(&y).unwrap();
        let pm = c2_parity(&mix).unwrap();
        for j in 0..4 {
            assert_eq!(pm[j],crate::gf::mul(a,px[j]) ^ crate::gf::mul(b,py[j]));
        }
    }

    #[test]
    fn generator_cache() {
        let mut cache = GeneratorCache::new();
        // g(x) for 4 parities, roots alpha^0..alpha^3
        assert_eq!(cache.generator(4).unwrap(),&[0x40,0x78,0x36,0x0f,0x01]);
        assert_eq!(cache.encode(&[0u8;24],4).unwrap(),vec![0,0,0,0]);
        assert!(cache.generator(33).is_err());
    }

    #[test]
    fn locate_errors() {
        let msg: Vec<u8> = (0..28).map(|i| (i*5+1) as u8).collect();
        let mut cw = c1_codeword(&msg);
        cw[3] ^= 0x55;
        cw[20] ^= 0x0a;
        let synd = syndromes(&cw);
        assert_ne!(synd,[0,0,0,0]);
        let lambda = berlekamp_massey(&synd);
        let mut found = chien_search(&lambda,32);
        found.sort();
        assert_eq!(found,vec![3,20]);
    }

    #[test]
    fn locate_with_erasures() {
        let msg: Vec<u8> = (0..28).map(|i| (i*29+2) as u8).collect();
        let mut cw = c1_codeword(&msg);
        cw[5] ^= 0x77;   // known erasure
        cw[11] ^= 0x31;  // known erasure
        cw[25] ^= 0x9c;  // unknown error
        let synd = syndromes(&cw);
        let folded = forney_syndromes(&synd,&[5,11]);
        let lambda = berlekamp_massey(&folded[2..]);
        assert_eq!(chien_search(&lambda,32),vec![25]);
    }
}
